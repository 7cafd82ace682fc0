use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::{types::PendingSignIn, warning};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PendingSignIn>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No sign-in in progress.</h4>");
    };

    // a redirect we did not start must not complete or abort the sign-in
    if params.get("state") != Some(&pending.csrf_state) {
        warning!("Ignoring sign-in callback with unexpected state.");
        return Html("<h4>Unexpected sign-in state.</h4>");
    }

    if let Some(error) = params.get("error") {
        pending.error = Some(error.clone());
        return Html("<h4>Sign-in was not granted.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.code = Some(code.clone());
            Html("<h2>Signed in.</h2><p>You can close this browser window.</p>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
