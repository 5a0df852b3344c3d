use std::time::Duration;

use life_organizer::config::RateLimitConfig;
use life_organizer::session::rate_limit::RateLimiter;
use life_organizer::AppError;

#[test]
fn allows_up_to_the_budget() {
    let limiter = RateLimiter::new(3, Duration::from_secs(60));

    for _ in 0..3 {
        assert!(limiter.check("U1").is_ok());
    }
    let err = limiter.check("U1").unwrap_err();

    assert!(matches!(err, AppError::RateLimited(_)));
    assert_eq!(err.to_string(), "rate limited: 3 events per 60s");
}

#[test]
fn users_have_separate_windows() {
    let limiter = RateLimiter::new(1, Duration::from_secs(60));

    assert!(limiter.check("U1").is_ok());
    assert!(limiter.check("U1").is_err());
    assert!(limiter.check("U2").is_ok());
}

#[tokio::test]
async fn window_restarts_after_expiry() {
    let limiter = RateLimiter::new(1, Duration::from_millis(50));
    assert!(limiter.check("U1").is_ok());
    assert!(limiter.check("U1").is_err());

    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(limiter.check("U1").is_ok());
}

#[test]
fn rejected_events_do_not_extend_the_count() {
    let limiter = RateLimiter::from_config(&RateLimitConfig {
        max_events: 2,
        window_seconds: 60,
    });

    assert!(limiter.check("U1").is_ok());
    assert!(limiter.check("U1").is_ok());
    for _ in 0..5 {
        assert!(limiter.check("U1").is_err());
    }
    assert!(limiter.check("U2").is_ok());
}
