//! Typed client declarations for a remote object

/// Declares a typed client for a remote object
///
/// Each declared method becomes a function that forwards to the remote
/// method of the same name and decodes the result. The call is sent when
/// the function is called, not when its future is first polled.
///
/// ```ignore
/// remote_interface! {
///     pub struct Calculator {
///         fn add(a: i64, b: i64) -> i64;
///         fn reset() -> ();
///     }
/// }
///
/// let calculator = Calculator::new(bridge.remote());
/// assert_eq!(calculator.add(2, 3).await?, 5);
/// ```
#[macro_export]
macro_rules! remote_interface {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident ( $( $arg:ident : $arg_ty:ty ),* $(,)? ) -> $ret:ty ;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            proxy: $crate::RemoteProxy,
        }

        impl $name {
            $vis fn new(proxy: $crate::RemoteProxy) -> Self {
                Self { proxy }
            }

            $(
                $(#[$method_meta])*
                $vis fn $method(
                    &self,
                    $( $arg: $arg_ty ),*
                ) -> impl ::std::future::Future<
                    Output = ::std::result::Result<$ret, $crate::RemoteError>,
                > {
                    self.proxy
                        .call_as::<_, $ret>(::std::stringify!($method), ( $( $arg, )* ))
                }
            )*
        }
    };
}
