use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::mpsc,
};

use tracing::warn;

use crate::error::InsertionError;

/// Runs `task` on `pool` for every item and returns the results in item order. A panicking
/// task fails the whole call.
pub fn evaluate_in_parallel<T, R, F>(
    pool: &rayon::ThreadPool,
    items: Vec<T>,
    task: F,
) -> Result<Vec<R>, InsertionError>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let count = items.len();
    let (sender, receiver) = mpsc::channel();

    pool.scope(|scope| {
        for (index, item) in items.into_iter().enumerate() {
            let sender = sender.clone();
            let task = &task;
            scope.spawn(move |_| {
                let result = panic::catch_unwind(AssertUnwindSafe(|| task(item)));
                // the receiver outlives the scope
                let _ = sender.send((index, result));
            });
        }
    });
    drop(sender);

    let mut results: Vec<Option<R>> = (0..count).map(|_| None).collect();
    for (index, result) in receiver {
        match result {
            Ok(value) => results[index] = Some(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "insertion worker failed");
                return Err(InsertionError::WorkerFailed(message));
            }
        }
    }

    Ok(results.into_iter().flatten().collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic")
    }
}
