//! Authorization strategies, one per scheme.

mod basic;
mod bearer;
mod inherit;
mod oauth1;
mod oauth2;
mod traits;

pub use basic::BasicStrategy;
pub use bearer::BearerStrategy;
pub use inherit::InheritFromParentStrategy;
pub use oauth1::{OAuth1Strategy, percent_encode, sign, signature_base_string, signing_key};
pub use oauth2::OAuth2Strategy;
pub use traits::AuthorizationStrategy;
