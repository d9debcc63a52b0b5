use core::time::Duration;
use embedded_hal::delay::DelayNs;

/// Counts down a budget of microseconds as a polling loop sleeps.
///
/// Time only advances through `tick`, so the budget follows whatever delay
/// provider drives the loop instead of a wall clock.
pub struct CountDownTimer {
    target_us: u32,
}

pub const BUTTON_DELAY: u32 = 500; // 500ms between calibration button checks
pub const SENSOR_DELAY: u32 = 1000; // 1000ms between moisture samples

impl CountDownTimer {
    pub fn new(budget: Duration) -> CountDownTimer {
        Self {
            target_us: micros(budget),
        }
    }

    pub fn tick(&mut self, elapsed_us: u32) {
        self.target_us = self.target_us.saturating_sub(elapsed_us);
    }

    pub fn is_finished(&self) -> bool {
        self.target_us == 0
    }
}

/// Polls `ready` until it reports true or the timeout runs out.
///
/// The condition is checked once more after the budget is spent, so a
/// zero timeout still samples the line once.
/// param delay: sleeps between polls and acts as the clock
/// param timeout: total time to wait
/// param interval: sleep between two polls (at least 1us)
/// param ready: condition to poll
/// returns: Ok(true) when ready, Ok(false) on timeout
pub fn poll_until<D, E, F>(
    delay: &mut D,
    timeout: Duration,
    interval: Duration,
    mut ready: F,
) -> Result<bool, E>
where
    D: DelayNs,
    F: FnMut() -> Result<bool, E>,
{
    let step_us = micros(interval).max(1);
    let mut countdown = CountDownTimer::new(timeout);

    loop {
        if ready()? {
            return Ok(true);
        }
        if countdown.is_finished() {
            return Ok(false);
        }
        delay.delay_us(step_us);
        countdown.tick(step_us);
    }
}

/// Duration in whole microseconds, saturated to u32
pub fn micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

/// Duration in whole nanoseconds, saturated to u32
pub fn nanos(duration: Duration) -> u32 {
    u32::try_from(duration.as_nanos()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn countdown_saturates() {
        let mut timer = CountDownTimer::new(Duration::from_micros(250));
        timer.tick(100);
        timer.tick(100);
        assert!(!timer.is_finished());
        timer.tick(49);
        assert!(!timer.is_finished());
        timer.tick(100);
        assert!(timer.is_finished());
        timer.tick(100);
        assert!(timer.is_finished());
    }

    #[test]
    fn poll_returns_as_soon_as_ready() {
        let mut polls = 0;
        let ready = poll_until::<_, Infallible, _>(
            &mut NoopDelay::new(),
            Duration::from_secs(5),
            Duration::from_micros(100),
            || {
                polls += 1;
                Ok(polls == 3)
            },
        );
        assert_eq!(ready, Ok(true));
        assert_eq!(polls, 3);
    }

    #[test]
    fn poll_times_out_after_budget() {
        let mut polls = 0;
        let ready = poll_until::<_, Infallible, _>(
            &mut NoopDelay::new(),
            Duration::from_micros(300),
            Duration::from_micros(100),
            || {
                polls += 1;
                Ok(false)
            },
        );
        assert_eq!(ready, Ok(false));
        // 300, 200, 100 and 0us left
        assert_eq!(polls, 4);
    }

    #[test]
    fn poll_propagates_line_errors() {
        let ready = poll_until(
            &mut NoopDelay::new(),
            Duration::from_secs(1),
            Duration::from_micros(100),
            || Err::<bool, _>("line gone"),
        );
        assert_eq!(ready, Err("line gone"));
    }

    #[test]
    fn zero_interval_still_terminates() {
        let mut polls = 0u32;
        let ready = poll_until::<_, Infallible, _>(
            &mut NoopDelay::new(),
            Duration::from_micros(5),
            Duration::ZERO,
            || {
                polls += 1;
                Ok(false)
            },
        );
        assert_eq!(ready, Ok(false));
        assert_eq!(polls, 6);
    }
}
