//! JSON boundary for the gamenote review store.
//!
//! Two surfaces over any [`gamenote_core::store::ReviewStore`]:
//!
//! - [`Backend`]: the callable facade the UI plugin talks to. Every call
//!   answers with a JSON string or a boolean and never fails.
//! - [`api_router`]: an axum [`Router`] exposing the same store as REST
//!   resources, plus `POST /backend/{method}` dispatching to [`Backend`].
//!
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gamenote_api::api_router(store.clone(), ClientConfig::default()))
//! ```

pub mod backend;
pub mod error;
pub mod ratings;
pub mod reviews;
pub mod wire;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gamenote_core::store::ReviewStore;

pub use backend::{Backend, ClientConfig};
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, client: ClientConfig) -> Router<()>
where
  S: ReviewStore + 'static,
{
  let rest: Router<()> = Router::new()
    // Reviews
    .route("/reviews", get(reviews::list::<S>))
    .route(
      "/reviews/{item_id}",
      get(reviews::get_one::<S>)
        .put(reviews::save_one::<S>)
        .delete(reviews::delete_one::<S>),
    )
    .route("/reviews/{item_id}/exists", get(reviews::exists::<S>))
    // Report
    .route("/ratings", get(ratings::handler::<S>))
    .with_state(store.clone());

  let callable: Router<()> = Router::new()
    .route("/backend/{method}", post(backend::call::<S>))
    .with_state(Backend::new(store, client));

  rest.merge(callable)
}
