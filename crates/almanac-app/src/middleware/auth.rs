use salvo::Depot;
use salvo::http::HeaderMap;
use uuid::Uuid;

use almanac_core::config::{AuthConfig, AuthMethod};
use almanac_core::constants::proxy_headers;
use almanac_core::error::CoreError;
use almanac_core::types::{Attribution, Owner};

use crate::config::get_config_from_depot;
use crate::error::{AppError, AppResult};

/// ## Summary
/// Middleware handler for owner resolution.
/// Use this as a handler in routes that act on behalf of a caller.
pub struct AuthMiddleware;

fn header_uuid(headers: &HeaderMap, name: &str) -> AppResult<Option<Uuid>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_err| AppError::Unauthorized(format!("header {name} is not valid text")))?;
    Uuid::parse_str(value.trim())
        .map(Some)
        .map_err(|_err| AppError::Unauthorized(format!("header {name} is not a UUID")))
}

/// ## Summary
/// Determines who a request acts for.
///
/// `single_owner` attributes every request to the configured owner. `proxy`
/// trusts the identity headers set by a fronting proxy.
///
/// ## Errors
/// `Unauthorized` if the proxy headers are missing or malformed; a
/// configuration error if single-owner mode has no owner configured.
pub fn resolve_owner(headers: &HeaderMap, auth: &AuthConfig) -> AppResult<Owner> {
    match auth.method {
        AuthMethod::SingleOwner => auth
            .single_owner
            .as_ref()
            .map(almanac_core::config::SingleOwnerAuthConfig::owner)
            .ok_or_else(|| {
                CoreError::ConfigError("auth.single_owner is required for single_owner auth".into())
                    .into()
            }),
        AuthMethod::Proxy => {
            let id = header_uuid(headers, proxy_headers::REMOTE_USER)?.ok_or_else(|| {
                AppError::Unauthorized(format!("missing {} header", proxy_headers::REMOTE_USER))
            })?;
            Ok(Owner::new(id).with_attribution(Attribution {
                department_id: header_uuid(headers, proxy_headers::REMOTE_DEPARTMENT)?,
                office_id: header_uuid(headers, proxy_headers::REMOTE_OFFICE)?,
                division_id: header_uuid(headers, proxy_headers::REMOTE_DIVISION)?,
            }))
        }
    }
}

/// ## Summary
/// Retrieves the resolved owner from the depot.
///
/// ## Errors
/// Returns an error if `AuthMiddleware` did not run for this route.
pub fn get_owner_from_depot(depot: &Depot) -> AppResult<Owner> {
    depot
        .obtain::<Owner>()
        .copied()
        .map_err(|_err| CoreError::InvariantViolation("Owner not found in depot").into())
}

/// ## Summary
/// Resolves the calling owner and stores it in the depot.
///
/// ## Side Effects
/// Injects the [`Owner`] into the depot for downstream handlers.
///
/// ## Errors
/// Responds 401 and stops the request if no owner can be resolved.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Resolving owner");

        let config = match get_config_from_depot(depot) {
            Ok(cfg) => cfg,
            Err(e) => {
                e.render(res);
                ctrl.skip_rest();
                return;
            }
        };

        match resolve_owner(req.headers(), &config.auth) {
            Ok(owner) => {
                tracing::debug!(owner = %owner, "Owner resolved");
                depot.inject(owner);
            }
            Err(e) => {
                e.render(res);
                ctrl.skip_rest();
            }
        }
    }
}
