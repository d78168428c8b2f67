use crate::types::reminder::PendingReminder;

pub trait PendingReminders: Clone + Send + Sync + 'static {
    type PendingFut<'a>: Future<Output = Vec<PendingReminder>> + Send + 'a
    where
        Self: 'a;
    type RemoveFut<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn pending<'a>(&'a self) -> Self::PendingFut<'a>;
    fn remove<'a>(&'a self, id: &'a str) -> Self::RemoveFut<'a>;
}
