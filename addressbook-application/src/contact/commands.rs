use crate::command::Command;

/// 以给定 id 与名称新建联系人
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContact {
    pub contact_id: String,
    pub name: String,
}

impl Command for CreateContact {
    const NAME: &'static str = "CreateContact";
}

/// 修改联系人名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeContactName {
    pub contact_id: String,
    pub new_name: String,
}

impl Command for ChangeContactName {
    const NAME: &'static str = "ChangeContactName";
}

/// 删除联系人，名称在提交后可被重新使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveContact {
    pub contact_id: String,
}

impl Command for RemoveContact {
    const NAME: &'static str = "RemoveContact";
}
