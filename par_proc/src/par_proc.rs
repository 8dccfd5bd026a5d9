use anyhow::{anyhow, bail, Result};
use core::iter::IntoIterator;
use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::thread::{Scope, ScopedJoinHandle};
use std::any::Any;

/// A generic processor trait that accepts items and can return an error
/// if the processing of the item fails.
pub trait Proc {
    /// The type of the items to be processed
    type Item;

    /// The type of the error produced on a processing failure
    type Err;

    /// Process one item
    fn process(&mut self, item: Self::Item) -> Result<(), Self::Err>;
}

// Given a receiver (`rec`) that can receive items of type `T` through a channel
// and a `processor` that knows how to process an item of type `T`, this function
// processes all the items that the receiver can receive.
fn process<P: Proc<Item = T, Err = E>, T: Send, E>(
    mut processor: P,
    rec: Receiver<T>,
) -> Result<P, E> {
    // Blocks until the next item arrives; ends once the channel is disconnected.
    for item in rec {
        processor.process(item)?;
    }
    Ok(processor)
}

/// Number of items queued ahead of the workers.
pub const READ_AHEAD: usize = 2;

#[allow(clippy::type_complexity)]
fn start_processors<'scope, 'env, P, T>(
    processors: Vec<P>,
    scope: &'scope Scope<'env>,
) -> (Sender<T>, Vec<ScopedJoinHandle<'scope, Result<P>>>)
where
    T: 'env + Send,
    P: 'env + Send + Proc<Item = T, Err = anyhow::Error>,
{
    // allow a little bit of read-ahead
    let (send, recv) = bounded(READ_AHEAD);

    // Make one thread dedicated to each processor object
    let mut handles = Vec::with_capacity(processors.len());
    for processor in processors {
        // Each thread gets a copy of the receiver
        let recv = recv.clone();
        let thread = scope.spawn(move |_| process(processor, recv));
        handles.push(thread);
    }
    (send, handles)
}

fn collect_jobs<P>(handles: Vec<ScopedJoinHandle<'_, Result<P>>>) -> Result<Vec<P>> {
    // let the threads finish up & return the processors
    let mut results = Vec::with_capacity(handles.len());
    for h in handles {
        // join() Returns Result<Result<P, E>, E>
        match h.join() {
            // return the inner processor value, bubbling up an Err
            Ok(v) => results.push(v?),

            // if a thread panicked, capture the panic message
            Err(e) => return Err(anyhow!(decipher_panic(e))),
        }
    }

    Ok(results)
}

/// Feed every item of `items` to a fixed pool of workers, one thread per
/// processor in `processors`. Items are handed out in iteration order to
/// whichever worker is free; completion order is unspecified. Returns the
/// processors once every item has been processed and every worker thread
/// has been joined. Processor objects should carry any results accumulators
/// as state.
///
/// With a single processor the items are processed one at a time, in order,
/// on the calling thread.
///
/// An `Err` from `Proc::process` stops that worker; the remaining workers
/// drain the queue and the first error is returned.
pub fn process_with_pool<I, P, T>(items: I, mut processors: Vec<P>) -> Result<Vec<P>>
where
    I: IntoIterator<Item = T>,
    T: Send,
    P: Send + Proc<Item = T, Err = anyhow::Error>,
{
    match processors.len() {
        0 => bail!("at least one processor is required"),
        1 => {
            let Some(mut processor) = processors.pop() else {
                unreachable!()
            };
            for item in items {
                processor.process(item)?;
            }
            return Ok(vec![processor]);
        }
        _ => (),
    }

    // Scoped threads are guaranteed to be joined before the scope ends, which
    // lets the processors borrow from the caller's stack.
    let r = crossbeam_utils::thread::scope(move |s| -> Result<Vec<P>> {
        let (send, handles) = start_processors(processors, s);

        for item in items {
            // stop sending if all the receivers have hung up;
            // go down and get the Error/panic from the dead worker
            if send.send(item).is_err() {
                break;
            }
        }

        // Close the send channel - this will cause the threads to exit
        drop(send);

        collect_jobs(handles)
    });

    match r {
        Ok(v) => v,
        Err(e) => Err(anyhow!(decipher_panic(e))),
    }
}

/// Extract the message from a panic payload.
pub fn decipher_panic(p: Box<dyn Any + 'static + Send>) -> String {
    if let Some(&s) = p.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Ok(s) = p.downcast::<String>() {
        *s
    } else {
        "thread panicked with unrecognized type".to_string()
    }
}
