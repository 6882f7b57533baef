dyn_clone::clone_trait_object!(<T> FeedbackController<T>);

/// A feedback controller turning an error into an actuation effort.
pub trait FeedbackController<T>: dyn_clone::DynClone {
    fn update(&mut self, error: T, delta_time: T) -> T;
    fn reset(&mut self);
}

pub mod pid;
