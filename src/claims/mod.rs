mod map;
mod standard;
mod strings;
mod time;
mod validator;

pub use map::MapClaims;
pub use standard::StandardClaims;
pub use strings::ClaimStrings;
pub use time::{NumericDate, TIME_PRECISION};
pub use validator::{ClaimResult, Clock, ValidationHelper};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ValidationError;

/// A claims set that can be carried in a token
///
/// Two implementations ship with the crate: [`MapClaims`] for arbitrary JSON
/// objects and [`StandardClaims`] for the registered claims. Application
/// types implement this trait to plug their own checks into parsing.
///
/// `validate` must run every check and merge the failures into one
/// [`ValidationError`] instead of stopping at the first, so callers see every
/// violated constraint at once.
pub trait Claims: Serialize + DeserializeOwned {
    fn validate(&self, helper: &ValidationHelper) -> Result<(), ValidationError>;
}
