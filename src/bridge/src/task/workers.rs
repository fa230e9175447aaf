//! The per-device-class task loops.
//!
//! Every class runs a host-command task, which polls the line for host
//! commands, and a bus-write task, which drains the bridging queue. Both
//! take the shared bus lock for each step and never hold it across a sleep.

use alloc::sync::Arc;
use log::debug;
use ps2bridge_hal::{Clock, Delay, Indicator, Transport};

use super::{sleep, yield_now, TimerQueue};
use crate::pipeline::{Forward, KeyboardPipeline, MousePipeline};

/// Answer keyboard host commands and mirror the LED state.
pub async fn keyboard_host_task<T, D, C, I>(
    pipeline: Arc<KeyboardPipeline<T, D>>,
    timers: Arc<TimerQueue>,
    clock: C,
    mut indicator: I,
) where
    T: Transport,
    D: Delay,
    C: Clock,
    I: Indicator,
{
    let poll_us = pipeline.config().poll_interval_us as u64;
    loop {
        let result = {
            let bus = pipeline.bus().lock().await;
            pipeline.service_host(&bus)
        };
        match result {
            Ok(Some(leds)) => indicator.set_leds(leds),
            Ok(None) => {}
            Err(e) => debug!("keyboard: reply interrupted: {}", e),
        }
        sleep(&timers, &clock, poll_us).await;
    }
}

/// Deliver queued scancodes in order, retrying interrupted frames.
pub async fn keyboard_write_task<T, D, C>(
    pipeline: Arc<KeyboardPipeline<T, D>>,
    timers: Arc<TimerQueue>,
    clock: C,
)
where
    T: Transport,
    D: Delay,
    C: Clock,
{
    let backoff_us = pipeline.config().poll_interval_us as u64;
    loop {
        pipeline.queue().head().await;
        let outcome = {
            let bus = pipeline.bus().lock().await;
            pipeline.forward_head(&bus)
        };
        match outcome {
            Forward::Failed(_) => sleep(&timers, &clock, backoff_us).await,
            _ => yield_now().await,
        }
    }
}

/// Answer mouse host commands.
pub async fn mouse_host_task<T, D, C>(
    pipeline: Arc<MousePipeline<T, D>>,
    timers: Arc<TimerQueue>,
    clock: C,
)
where
    T: Transport,
    D: Delay,
    C: Clock,
{
    let poll_us = pipeline.config().poll_interval_us as u64;
    loop {
        let result = {
            let bus = pipeline.bus().lock().await;
            pipeline.service_host(&bus)
        };
        if let Err(e) = result {
            debug!("mouse: reply interrupted: {}", e);
        }
        sleep(&timers, &clock, poll_us).await;
    }
}

/// Deliver queued motion, at most one stream report per sample interval.
pub async fn mouse_write_task<T, D, C>(
    pipeline: Arc<MousePipeline<T, D>>,
    timers: Arc<TimerQueue>,
    clock: C,
)
where
    T: Transport,
    D: Delay,
    C: Clock,
{
    loop {
        let frame = pipeline.queue().next().await;
        loop {
            let wait = pipeline.report_delay_us(clock.now_us());
            if wait == 0 {
                break;
            }
            sleep(&timers, &clock, wait).await;
        }
        {
            let bus = pipeline.bus().lock().await;
            pipeline.forward(&frame, clock.now_us(), &bus);
        }
        yield_now().await;
    }
}
