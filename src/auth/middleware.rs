//! Guards for owned routes: they resolve the session cookie to a [CurrentUser]
//! and keep active sessions alive.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use time::UtcOffset;

use crate::{
    Error,
    auth::{
        CurrentUser, DEFAULT_COOKIE_DURATION, ReturnPath, SessionState,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        get_user_by_id,
    },
};

/// How a guard turns away a client that is not logged in.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    /// A 303 redirect, for full page loads.
    Redirect,
    /// An `HX-Redirect` header so HTMX navigates instead of swapping the log-in
    /// page into the current one.
    HxRedirect,
}

impl Rejection {
    fn respond(self, log_in_url: &str) -> Response {
        match self {
            Rejection::Redirect => Redirect::to(log_in_url).into_response(),
            Rejection::HxRedirect => {
                (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response()
            }
        }
    }
}

/// Find the user that the session cookie in `jar` belongs to.
///
/// A token for a user that no longer exists counts as logged out.
fn load_session_user(state: &SessionState, jar: &PrivateCookieJar) -> Result<CurrentUser, Error> {
    let user_id = get_token_from_cookies(jar)?.user_id;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection)
        .map(CurrentUser::from)
        .inspect_err(|error| {
            tracing::warn!("Could not load user {user_id} from session token: {error}")
        })
}

/// Append the session cookie from `jar`, pushed out to the default session
/// length if it is close to expiring, to `response`.
fn with_extended_session(
    response: Response,
    jar: PrivateCookieJar,
    local_offset: UtcOffset,
) -> Response {
    let jar =
        extend_auth_cookie_duration_if_needed(jar.clone(), DEFAULT_COOKIE_DURATION, local_offset)
            .unwrap_or_else(|error| {
                tracing::error!("Error extending cookie duration: {error:?}. Keeping old cookie.");
                jar
            });

    let (mut parts, body) = response.into_parts();
    for cookie in jar.into_response().headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, cookie.to_owned());
    }

    Response::from_parts(parts, body)
}

async fn guard(
    state: SessionState,
    request: Request,
    next: Next,
    rejection: Rejection,
) -> Response {
    let log_in_url = ReturnPath::for_request(&request)
        .unwrap_or_else(|| {
            tracing::warn!(
                "No usable return path for {}. Falling back to dashboard.",
                request.uri().path()
            );
            ReturnPath::default()
        })
        .log_in_url();

    let local_offset = match state.local_offset() {
        Ok(offset) => offset,
        Err(error) => {
            tracing::error!("{error}. Redirecting to log in page.");
            return rejection.respond(&log_in_url);
        }
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return rejection.respond(&log_in_url);
        }
    };

    let Ok(user) = load_session_user(&state, &jar) else {
        return rejection.respond(&log_in_url);
    };

    parts.extensions.insert(user.id);
    parts.extensions.insert(user);
    let response = next.run(Request::from_parts(parts, body)).await;

    with_extended_session(response, jar, local_offset)
}

/// Guard for pages: redirects logged out clients to the log-in page.
///
/// **Note**: Route handlers can use `Extension(user): Extension<CurrentUser>`
/// or `Extension(user_id): Extension<UserID>` to receive the logged in user.
pub async fn auth_guard(State(state): State<SessionState>, request: Request, next: Next) -> Response {
    guard(state, request, next, Rejection::Redirect).await
}

/// Guard for HTMX API routes: logged out clients get an `HX-Redirect` to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, Rejection::HxRedirect).await
}
