/// Page-level navigation, as exposed by the hosting browser context
pub trait Navigator: Send + Sync + 'static {
    /// Hard navigation (assigns the location; adds a history entry)
    fn navigate(&self, url: &str);

    /// Client-side navigation that replaces the current history entry
    fn replace(&self, url: &str);
}
