mod flow;

pub use flow::{AuthFlow, Authenticated, ProtectedResources};
