//! Session state file: every `Saveable` resource (settings, RNG) written as
//! one bitcode-encoded extension map.
//!
//! `ARBORIST_STATE` names the file. It is read at startup when present and
//! written by the headless run after the safe-unwind boundary, so the saved
//! settings never describe a world with seasonal overrides applied.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;

use simulation::SaveableRegistry;

pub const STATE_ENV: &str = "ARBORIST_STATE";

pub fn state_path() -> Option<String> {
    std::env::var(STATE_ENV).ok()
}

pub fn encode_state(world: &World) -> Vec<u8> {
    let extensions = world.resource::<SaveableRegistry>().save_all(world);
    bitcode::encode(&extensions)
}

/// Restores every registered resource found in `bytes`. Returns `false` and
/// leaves the world untouched when the bytes do not decode.
pub fn restore_state(world: &mut World, bytes: &[u8]) -> bool {
    let extensions: BTreeMap<String, Vec<u8>> = match bitcode::decode(bytes) {
        Ok(map) => map,
        Err(e) => {
            warn!("Session: state of {} bytes does not decode: {}", bytes.len(), e);
            return false;
        }
    };
    let report = world.resource_scope(|world, registry: Mut<SaveableRegistry>| {
        registry.load_all(world, &extensions)
    });
    info!("Session: restored {:?}", report.restored);
    true
}

pub fn save_to_file(world: &World, path: &Path) {
    let bytes = encode_state(world);
    match std::fs::write(path, &bytes) {
        Ok(()) => info!("Session: wrote {} bytes to {}", bytes.len(), path.display()),
        Err(e) => warn!("Session: cannot write {}: {}", path.display(), e),
    }
}

pub fn load_from_file(world: &mut World, path: &Path) {
    match std::fs::read(path) {
        Ok(bytes) => {
            restore_state(world, &bytes);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Session: no state at {}, starting fresh", path.display());
        }
        Err(e) => warn!("Session: cannot read {}: {}", path.display(), e),
    }
}

/// Startup system: loads `ARBORIST_STATE` if it is set.
pub fn load_session(world: &mut World) {
    if let Some(path) = state_path() {
        load_from_file(world, Path::new(&path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::config::VegetationSettings;
    use simulation::sim_rng::SimRng;
    use simulation::SimulationPlugin;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(SimulationPlugin);
        app
    }

    #[test]
    fn test_state_round_trips_settings_and_rng() {
        let mut source = app();
        source
            .world_mut()
            .resource_mut::<VegetationSettings>()
            .disable_all_growth = true;
        source.world_mut().resource_mut::<SimRng>().batch_seed();
        let bytes = encode_state(source.world());

        let mut target = app();
        assert!(restore_state(target.world_mut(), &bytes));
        assert!(target.world().resource::<VegetationSettings>().disable_all_growth);

        let expected = source.world_mut().resource_mut::<SimRng>().batch_seed();
        let restored = target.world_mut().resource_mut::<SimRng>().batch_seed();
        assert_eq!(expected, restored);
    }

    #[test]
    fn test_corrupt_state_keeps_defaults() {
        let mut target = app();
        assert!(!restore_state(target.world_mut(), &[0xff, 0x01]));
        assert_eq!(
            *target.world().resource::<VegetationSettings>(),
            VegetationSettings::default()
        );
    }
}
