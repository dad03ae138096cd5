pub trait CallResult: Send + 'static {}
impl<T: Send + 'static> CallResult for T {}

pub trait CallError: Send + 'static {}
impl<E: Send + 'static> CallError for E {}

pub trait CallParams: Clone + Send + 'static {}
impl<A: Clone + Send + 'static> CallParams for A {}
