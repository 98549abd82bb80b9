pub mod form;
pub mod navigation;
pub mod relay;

pub use form::{ContactFormController, FormState, StatusBanner, SubmitRejection};
pub use navigation::{
    ActiveNavigation, NavigationError, NavigationState, NavigationTracker, PageLayout,
    ScrollBus, SectionBounds,
};
pub use relay::{FormRelay, HttpFormRelay, MissingFormRelay};
