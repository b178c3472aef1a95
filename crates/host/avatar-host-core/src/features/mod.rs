pub mod gesture;
pub mod lipsync;
pub mod point_of_interest;
pub mod speech;

pub use gesture::GestureFeature;
pub use lipsync::LipsyncFeature;
pub use point_of_interest::{look_angles, PointOfInterestFeature};
pub use speech::{SpeechFeature, SpeechUpdate};
