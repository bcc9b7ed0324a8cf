mod graph;

pub use graph::GraphDocumentSource;
