use crate::{config::Config, error::AppError, services::auth::AuthUser, state::AppState};
use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use async_trait::async_trait;
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};
use tracing::{debug, warn};

pub type KeyedRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

/// 按配置构建限流器：每个 IP 在 `rate_limit_window` 秒内最多 `rate_limit_requests` 次
pub fn build_rate_limiter(config: &Config) -> Result<KeyedRateLimiter, AppError> {
    let requests = NonZeroU32::new(config.rate_limit_requests)
        .ok_or_else(|| AppError::internal("RATE_LIMIT_REQUESTS must be greater than zero"))?;
    let window = Duration::from_secs(config.rate_limit_window.max(1));

    let quota = Quota::with_period(window / requests.get())
        .ok_or_else(|| AppError::internal("Rate limit period must be non-zero"))?
        .allow_burst(requests);

    Ok(RateLimiter::dashmap(quota))
}

/// 认证中间件
///
/// 有效的 Bearer 令牌会在请求扩展中放入 `AuthUser`；无效令牌按匿名请求处理。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(&headers) {
        match app_state.auth_service.verify_jwt(token) {
            Ok(claims) => match app_state.user_service.get_user_by_id(&claims.sub).await {
                Ok(user) => {
                    debug!("Authenticated user: {} ({})", user.username, claims.sub);
                    request.extensions_mut().insert(AuthUser::from(&user));
                }
                Err(e) => {
                    warn!("Token subject {} no longer resolves: {}", claims.sub, e);
                }
            },
            Err(e) => {
                debug!("JWT verification failed: {}", e);
                // 不返回错误，让请求继续处理（作为未认证请求）
            }
        }
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    let client_ip = get_client_ip(&request);

    match app_state.rate_limiter.check_key(&client_ip) {
        Ok(_) => {
            debug!("Rate limit check passed for IP: {}", client_ip);
            Ok(next.run(request).await)
        }
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// 请求 ID 中间件
pub async fn request_id_middleware(mut request: Request<Body>, next: Next<Body>) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}

/// 获取客户端 IP 地址
fn get_client_ip(request: &Request<Body>) -> String {
    let headers = request.headers();

    // 检查常见的代理头
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(ip_str) = forwarded_for.to_str() {
            if let Some(ip) = ip_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.trim().to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 请求 ID 包装器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// 可选认证提取器
pub struct OptionalAuth(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// 必须认证的提取器，未登录时返回 401
pub struct RequireAuth(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| AppError::unauthorized("Authentication credentials were not provided."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(get_client_ip(&request), "203.0.113.7");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(get_client_ip(&request), "unknown");
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert("authorization", HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_rate_limiter_blocks_after_quota() {
        let mut config = Config::default();
        config.rate_limit_requests = 2;
        config.rate_limit_window = 60;
        let limiter = build_rate_limiter(&config).unwrap();

        let key = "198.51.100.1".to_string();
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_err());

        // 其他 IP 不受影响
        assert!(limiter.check_key(&"198.51.100.2".to_string()).is_ok());
    }

    #[test]
    fn test_zero_requests_rejected() {
        let mut config = Config::default();
        config.rate_limit_requests = 0;
        assert!(build_rate_limiter(&config).is_err());
    }
}
