/// Implements the `std::ops` traits on single-field newtypes by delegating to the wrapped value.
///
/// * `binary` - `Self op Self -> Self`
/// * `inplace` - `Self op= Self`
/// * `unary` - `op Self -> Self`
/// * `scalar` - `Self op $rhs -> Self`, where `$inner` (the wrapped type) implements `From<$rhs>`
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(self.0.$impl_fn())
            }
        }
    };

    (scalar $for_struct:ident($inner:ty), $rhs:ty, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait<$rhs> for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: $rhs) -> Self::Output {
                Self(self.0.$impl_fn(<$inner>::from(rhs)))
            }
        }
    };
}
