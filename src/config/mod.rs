pub mod settings;

pub use settings::MeshSettings;
