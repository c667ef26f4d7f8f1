/// A cursor's private clipboard (spec §3 Cursor, §6 "register store").
/// The view engine never reads or writes a register's contents — it only
/// owns the slot and releases it when its cursor is disposed — but a
/// minimal concrete store is supplied here since no other crate in this
/// workspace provides one.
#[derive(Debug, Clone, Default)]
pub struct Register {
    contents: Option<String>,
    linewise: bool,
}

impl Register {
    pub fn set(&mut self, text: impl Into<String>, linewise: bool) {
        self.contents = Some(text.into());
        self.linewise = linewise;
    }

    pub fn get(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn is_linewise(&self) -> bool {
        self.linewise
    }

    pub fn clear(&mut self) {
        self.contents = None;
        self.linewise = false;
    }
}
