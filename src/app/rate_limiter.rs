/**
 * Just count the amount of times sensitive endpoints are
 * being called per unit of time, supposed to block them
 * entirely for a specific "block time" when that happens.
 * The current time is always given by the caller.
 */
#[derive(Debug)]
pub struct BasicRateLimiter {
  counter: u32,
  last_update: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32,
    now: i64
  ) -> Self {
    Self {
      counter: 0,
      last_update: now,
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  pub fn is_expired(&self, now: i64) -> bool {
    // If currently locked, check if past block_duration.
    // Check if past max_request_time otherwise.
    if self.is_locked() {
      now - self.last_update >= self.block_duration.into()
    } else {
      now - self.last_update >= self.max_requests_time.into()
    }
  }

  // Counts one request, returns true if that request
  // has to be refused.
  pub fn update(&mut self, now: i64) -> bool {
    if self.is_expired(now) {
      // Reset, this request starts a new window:
      self.counter = 1;
      self.last_update = now;
      self.is_limited = false;
    } else if !self.is_limited {
      self.counter += 1;
      // Are we above the rate limit?
      if self.counter > self.max_requests {
        self.is_limited = true;
        // The block starts now:
        self.last_update = now;
      }
    }
    self.is_limited
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn allows_up_to_max_requests() {
    let mut rl = BasicRateLimiter::new(3, 60, 120, 1000);
    assert!(!rl.update(1001));
    assert!(!rl.update(1002));
    assert!(!rl.update(1003));
    assert!(rl.update(1004));
    assert!(rl.is_locked());
  }

  #[test]
  fn block_lasts_for_block_duration() {
    let mut rl = BasicRateLimiter::new(1, 60, 120, 1000);
    assert!(!rl.update(1000));
    assert!(rl.update(1001));
    assert!(rl.update(1120));
    assert!(!rl.update(1121));
    assert!(!rl.is_locked());
  }

  #[test]
  fn counter_resets_after_the_window() {
    let mut rl = BasicRateLimiter::new(2, 60, 120, 1000);
    assert!(!rl.update(1000));
    assert!(!rl.update(1030));
    assert!(!rl.update(1061));
    assert!(!rl.update(1062));
    assert!(rl.update(1063));
  }
}
