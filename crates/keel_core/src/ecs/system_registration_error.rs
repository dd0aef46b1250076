use thiserror::Error;

/// Errors that can occur while registering a system with the world.
#[derive(Debug, Error)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system '{name}' declares an empty component signature")]
    EmptySignature { name: String },

    #[error("system '{system}' references unknown component '{component}' (registered: {registered})")]
    UnknownComponent {
        system: String,
        component: String,
        registered: String,
    },

    #[error("system '{system}' binds unknown field '{field}' on component '{component}'")]
    UnknownField {
        system: String,
        component: String,
        field: String,
    },

    #[error("system '{system}' declares alias '{alias}' more than once")]
    DuplicateAlias { system: String, alias: String },
}
