pub mod favorite;
pub mod feedback;
pub mod photo;
pub mod profile;
pub mod submission;
pub mod venue;

pub use favorite::Entity as Favorite;
pub use feedback::{Entity as Feedback, Model as FeedbackModel};
pub use photo::{Entity as Photo, Model as PhotoModel};
pub use profile::{Entity as Profile, Model as ProfileModel};
pub use submission::{Entity as Submission, Model as SubmissionModel};
pub use venue::{Entity as Venue, Model as VenueModel};
