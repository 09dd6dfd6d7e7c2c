//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod identity;
pub mod meetups;
pub mod metadata;
pub mod presentations;
pub mod responses;
pub mod schemas;
pub mod speakers;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every REST handler. Mount inside the `/api/v1` scope.
///
/// Literal segments (`find`, `sync`) are registered ahead of the `{id}`
/// routes that would otherwise capture them.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(speakers::list_speakers)
        .service(speakers::create_speaker)
        .service(speakers::find_speaker)
        .service(speakers::get_speaker)
        .service(speakers::update_speaker)
        .service(speakers::delete_speaker)
        .service(presentations::list_presentations)
        .service(presentations::create_presentation)
        .service(presentations::find_presentation)
        .service(presentations::get_presentation)
        .service(presentations::update_presentation)
        .service(presentations::delete_presentation)
        .service(presentations::upvote)
        .service(presentations::downvote)
        .service(presentations::has_upvoted)
        .service(meetups::list_meetups)
        .service(meetups::create_meetup)
        .service(meetups::sync_meetups)
        .service(meetups::get_meetup)
        .service(meetups::update_meetup)
        .service(meetups::delete_meetup)
        .service(meetups::delete_meetup_via_get)
        .service(metadata::get_metadata)
        .service(metadata::put_metadata)
        .service(metadata::delete_metadata);
}
