use pipelog::log::{Context, Logger};

/// Application-style helper that logs on behalf of its caller.
#[inline(never)]
pub fn audit(logger: &mut Logger, action: &str) {
    logger.notice("audit: {action}", &Context::new().with("action", action));
}
