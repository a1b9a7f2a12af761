pub mod pin_setting;
pub mod place;
pub mod profile;
pub mod share;

// Re-export common types
pub use pin_setting::{NewPinSetting, PinLabelEntry, PinSetting, SavePinSettingsRequest};
pub use place::{
    CreatePlaceRequest, NewPlace, Place, PlaceResponse, SetVisibilityRequest, UpdatePlace,
    UpdatePlaceRequest,
};
pub use profile::{NewProfile, Profile, ProfileResponse, UpdateNicknameRequest};
pub use share::{
    CreateShareTokenRequest, ExpirationClass, ImportPlaceRequest, NewShareToken, ShareIdentifier,
    ShareResolutionResponse, ShareToken, ShareTokenResponse, SharedLink,
};
