//! Individual command implementations.

mod attrs;
mod get;
mod help;
mod info;
mod list;
mod password;
mod quit;

pub use attrs::AttrsCommand;
pub use get::GetCommand;
pub use help::HelpCommand;
pub use info::InfoCommand;
pub use list::ListCommand;
pub use password::PasswordCommand;
pub use quit::QuitCommand;

use std::sync::Arc;

use super::command::CommandRegistry;

/// Registers all built-in commands with the registry.
pub fn register_all(registry: &mut CommandRegistry) {
    registry.register(Arc::new(ListCommand));
    registry.register(Arc::new(InfoCommand));
    registry.register(Arc::new(GetCommand));
    registry.register(Arc::new(AttrsCommand));
    registry.register(Arc::new(PasswordCommand));
    registry.register(Arc::new(HelpCommand));
    registry.register(Arc::new(QuitCommand));
}

/// In-memory host with one PIV, one signature and one encryption identity.
#[cfg(test)]
pub(crate) fn test_host() -> crate::host::KeyShare {
    use crate::attributes::{AttributeValue, Attributes};
    use crate::credential::{Category, Credential};
    use crate::secret::MemorySecretStore;
    use crate::store::MemoryStore;

    fn der(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x30, payload.len() as u8];
        out.extend_from_slice(payload);
        out
    }

    let mut attributes = Attributes::new();
    attributes.insert("can_sign".to_string(), AttributeValue::Bool(true));
    attributes.insert("mystery".to_string(), AttributeValue::Number(7));

    let credentials = vec![
        Credential::new(
            Some("auth"),
            Category::Authentication,
            100,
            Some("01".to_string()),
            der(b"auth-cert"),
            der(b"auth-key"),
        )
        .with_attributes(attributes),
        Credential::new(
            Some("sig"),
            Category::Signature,
            50,
            Some("02".to_string()),
            der(b"sig-cert"),
            der(b"sig-key"),
        ),
        Credential::new(
            Some("enc"),
            Category::Encryption,
            10,
            Some("03".to_string()),
            der(b"enc-cert"),
            der(b"enc-key"),
        ),
    ];

    crate::host::KeyShare::new(
        Arc::new(MemoryStore::with_credentials(credentials)),
        Arc::new(MemorySecretStore::new()),
    )
}
