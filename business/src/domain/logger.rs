/// Logging port for the suggestion pipeline.
///
/// Implemented by the infrastructure logger; injected as `Arc<dyn Logger>`
/// so use cases and background tasks can be tested with a mock.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}
