//! Domain ports for the settings backend, the preference store and the
//! session collaborator.

mod macros;
pub(crate) use macros::define_port_error;

mod preference_store;
mod session_authority;
mod settings_transport;

#[cfg(test)]
pub use preference_store::MockPreferenceStore;
pub use preference_store::{
    COLUMN_VISIBILITY_KEY_PREFIX, FixturePreferenceStore, PreferenceStore, PreferenceStoreError,
    column_visibility_key,
};
#[cfg(test)]
pub use session_authority::MockSessionAuthority;
pub use session_authority::{FixtureSessionAuthority, SessionAuthority};
#[cfg(test)]
pub use settings_transport::MockSettingsTransport;
pub use settings_transport::{
    EntityConfigPatch, EntityConfigs, EntitySettingDelete, EntitySettingPatch,
    FixtureSettingsTransport, SettingsTransport, SettingsTransportError, ViewOptions,
};
