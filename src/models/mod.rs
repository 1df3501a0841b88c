pub mod contact;
pub mod driver;
pub mod location;
pub mod message;
pub mod ride;
pub mod sos;

pub use contact::EmergencyContact;
pub use driver::{BackgroundCheckStatus, DriverInfo, VerificationStatus};
pub use location::RideLocation;
pub use message::LocationMessage;
pub use ride::{PaymentStatus, Ride, RideCategory, RideStatus};
pub use sos::{DispatchStatus, SosAlert};
