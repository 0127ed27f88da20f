use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct EditDays {
    pub(super) days_worked: i32,
}
