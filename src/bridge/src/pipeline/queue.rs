//! Bounded, lossy frame queue between the network and a bus-write task.
//!
//! The producer side never waits: pushing into a full queue hands the frame
//! back and the caller drops it. The consumer side can wait for frames
//! asynchronously, either taking them ([`BridgeQueue::next`]) or looking at
//! the head without removing it ([`BridgeQueue::head`]).

use alloc::collections::VecDeque;
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use futures_util::task::AtomicWaker;
use ps2bridge_common::EventFrame;
use spin::Mutex;

/// Single-producer, single-consumer frame queue with fixed capacity.
pub struct BridgeQueue {
    frames: Mutex<VecDeque<EventFrame>>,
    capacity: usize,
    waker: AtomicWaker,
}

impl BridgeQueue {
    /// Create an empty queue holding at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            waker: AtomicWaker::new(),
        }
    }

    /// Append a frame; a full queue returns it unchanged.
    pub fn push(&self, frame: EventFrame) -> Result<(), EventFrame> {
        {
            let mut frames = self.frames.lock();
            if frames.len() >= self.capacity {
                return Err(frame);
            }
            frames.push_back(frame);
        }
        self.waker.wake();
        Ok(())
    }

    /// Remove and return the oldest frame.
    pub fn pop(&self) -> Option<EventFrame> {
        self.frames.lock().pop_front()
    }

    /// Copy of the oldest frame, left in the queue.
    pub fn peek(&self) -> Option<EventFrame> {
        self.frames.lock().front().copied()
    }

    /// Drop the oldest frame after it was delivered.
    pub fn remove_head(&self) -> Option<EventFrame> {
        self.pop()
    }

    /// Frames currently queued.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Returns `true` if no frame is queued.
    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Maximum number of queued frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wait for and remove the next frame.
    pub fn next(&self) -> NextFrame<'_> {
        NextFrame { queue: self }
    }

    /// Wait for a frame and return a copy of the head.
    pub fn head(&self) -> HeadFrame<'_> {
        HeadFrame { queue: self }
    }

    fn poll_with(
        &self,
        cx: &mut Context<'_>,
        take: impl Fn(&Self) -> Option<EventFrame>,
    ) -> Poll<EventFrame> {
        // fast path
        if let Some(frame) = take(self) {
            return Poll::Ready(frame);
        }

        self.waker.register(cx.waker());
        match take(self) {
            Some(frame) => {
                self.waker.take();
                Poll::Ready(frame)
            }
            None => Poll::Pending,
        }
    }
}

/// Future returned by [`BridgeQueue::next`].
pub struct NextFrame<'a> {
    queue: &'a BridgeQueue,
}

impl Future for NextFrame<'_> {
    type Output = EventFrame;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<EventFrame> {
        self.queue.poll_with(cx, BridgeQueue::pop)
    }
}

/// Future returned by [`BridgeQueue::head`].
pub struct HeadFrame<'a> {
    queue: &'a BridgeQueue,
}

impl Future for HeadFrame<'_> {
    type Output = EventFrame;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<EventFrame> {
        self.queue.poll_with(cx, BridgeQueue::peek)
    }
}
