use std::sync::{Mutex as Mutex_, MutexGuard, PoisonError};

/// `std::sync::Mutex` that is only ever accessed through a closure, so a guard can not be held
/// across an await point or leak out of the critical section.
#[derive(Debug)]
pub struct Mutex<T: ?Sized>(Mutex_<T>);

impl<T> Mutex<T> {
    /// Locks the mutex, runs `thunk` on the inner value and releases the lock. A poisoned lock is
    /// returned as an error.
    ///
    /// Never unwrap inside the closure, a panic there poisons the lock for every other user.
    pub fn safe_lock<F, Ret>(&self, thunk: F) -> Result<Ret, PoisonError<MutexGuard<'_, T>>>
    where
        F: FnOnce(&mut T) -> Ret,
    {
        let mut lock = self.0.lock()?;
        let return_value = thunk(&mut *lock);
        drop(lock);
        Ok(return_value)
    }

    pub fn new(v: T) -> Self {
        Mutex(Mutex_::new(v))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn poisoned_lock_is_an_error() {
        let mutex = Arc::new(Mutex::new(0_u32));
        let value = mutex
            .safe_lock(|v| {
                *v += 1;
                *v
            })
            .unwrap();
        assert_eq!(value, 1);

        let cloned = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _ = cloned.safe_lock(|_| panic!("poison"));
        })
        .join();
        assert!(mutex.safe_lock(|v| *v).is_err());
    }
}
