pub mod debug_exporter;

pub use debug_exporter::DebugExporter;
