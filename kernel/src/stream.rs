use std::collections::VecDeque;
use parking_lot::Mutex;

type Job = Box<dyn FnOnce() + Send>;

/// Ordered asynchronous work queue standing in for a device stream.
/// `enqueue` returns before the job runs; jobs execute in FIFO order when the
/// owner calls `synchronize`.
pub struct Stream {
    jobs: Mutex<VecDeque<Job>>,
}

impl Stream {
    pub fn new() -> Self {
        Self { jobs: Mutex::new(VecDeque::new()) }
    }

    /// Queue a job on this stream.
    pub fn enqueue<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.lock().push_back(Box::new(job));
    }

    /// Run every queued job, in submission order, on the calling thread.
    pub fn synchronize(&self) {
        loop {
            let job = self.jobs.lock().pop_front();
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }

    /// Number of jobs queued and not yet run.
    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn jobs_run_in_submission_order() {
        let stream = Stream::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let log = log.clone();
            stream.enqueue(move || log.lock().push(i));
        }
        assert_eq!(stream.pending(), 4);

        stream.synchronize();
        assert_eq!(stream.pending(), 0);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn enqueue_does_not_run_the_job() {
        let stream = Stream::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let flag = ran.clone();
        stream.enqueue(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        stream.synchronize();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
