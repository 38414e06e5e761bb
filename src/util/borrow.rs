pub(crate) trait CowExt<T: ToOwned + ?Sized> {
    fn take_owned(self) -> Option<T::Owned>;
}

impl<T: ToOwned + ?Sized> CowExt<T> for std::borrow::Cow<'_, T> {
    fn take_owned(self) -> Option<T::Owned> {
        match self {
            Self::Owned(owned) => Some(owned),
            Self::Borrowed(_) => None,
        }
    }
}
