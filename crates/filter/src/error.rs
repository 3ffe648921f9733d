use feats_catalog::CatalogError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Filtering was requested before a catalog finished loading
    #[error("No data: catalog is not loaded")]
    CatalogNotLoaded,

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A panel action named a control the panel does not offer
    #[error("Unknown panel control: {0}")]
    UnknownControl(String),

    /// Panel action issued while no panel is open
    #[error("Secondary panel is not open")]
    PanelClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

impl FilterError {
    pub fn unknown_control(control: impl Into<String>) -> Self {
        Self::UnknownControl(control.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
