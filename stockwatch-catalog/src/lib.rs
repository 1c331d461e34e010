pub mod alerts;
pub mod onboarding;

pub use alerts::{AlertEngine, AlertReport, LowStockAlert};
pub use onboarding::{FieldErrors, NewProductRequest, OnboardingError, OnboardingService};
