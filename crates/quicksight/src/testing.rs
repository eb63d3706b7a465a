//! Scripted control-plane fake shared by the crate's tests

use std::collections::VecDeque;
use std::sync::Mutex;

use quicksight_api::{
    AccountInfo, ApiFuture, CreateAccountSubscriptionInput, CreateAccountSubscriptionOutput,
    DeleteAccountSubscriptionInput, DeleteAccountSubscriptionOutput,
    DescribeAccountSubscriptionInput, DescribeAccountSubscriptionOutput, Error, QuickSightApi,
    RESOURCE_NOT_FOUND, SignupResponse,
};

/// One describe observation.
#[derive(Debug, Clone)]
pub(crate) enum Describe {
    /// Subscription for "acme" in the given status.
    Status(&'static str),
    Info(AccountInfo),
    NotFound,
    /// Success without `AccountInfo`.
    Empty,
    Fault(&'static str),
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Ok,
    /// Create succeeded but carried no signup payload.
    Empty,
    NotFound,
    Fault(&'static str),
}

fn fault(code: &str) -> Error {
    Error::Service {
        status: if code == RESOURCE_NOT_FOUND { 404 } else { 400 },
        code: code.to_owned(),
        message: format!("scripted {code}"),
        request_id: Some("req-fake".into()),
    }
}

pub(crate) fn account_info(status: &str) -> AccountInfo {
    AccountInfo {
        account_name: Some("acme".into()),
        account_subscription_status: Some(status.into()),
        authentication_type: Some("IAM_AND_QUICKSIGHT".into()),
        edition: Some("ENTERPRISE".into()),
        iam_identity_center_instance_arn: None,
        notification_email: Some("a@b.com".into()),
    }
}

/// Replays scripted replies. The last describe step repeats once the script
/// runs out.
pub(crate) struct FakeQuickSight {
    create: Reply,
    delete: Reply,
    describe: Mutex<VecDeque<Describe>>,
    creates: Mutex<Vec<CreateAccountSubscriptionInput>>,
    describes: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

impl FakeQuickSight {
    pub(crate) fn new() -> Self {
        Self {
            create: Reply::Ok,
            delete: Reply::Ok,
            describe: Mutex::new(VecDeque::from([Describe::Status("OK")])),
            creates: Mutex::new(Vec::new()),
            describes: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_create(mut self, reply: Reply) -> Self {
        self.create = reply;
        self
    }

    pub(crate) fn with_delete(mut self, reply: Reply) -> Self {
        self.delete = reply;
        self
    }

    pub(crate) fn with_describe(self, steps: impl IntoIterator<Item = Describe>) -> Self {
        *self.describe.lock().unwrap() = steps.into_iter().collect();
        self
    }

    pub(crate) fn create_inputs(&self) -> Vec<CreateAccountSubscriptionInput> {
        self.creates.lock().unwrap().clone()
    }

    pub(crate) fn describe_ids(&self) -> Vec<String> {
        self.describes.lock().unwrap().clone()
    }

    pub(crate) fn describe_count(&self) -> usize {
        self.describes.lock().unwrap().len()
    }

    pub(crate) fn delete_ids(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    fn next_describe(&self) -> Describe {
        let mut steps = self.describe.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap_or(Describe::NotFound)
        }
    }
}

impl QuickSightApi for FakeQuickSight {
    fn create_account_subscription<'a>(
        &'a self,
        input: &'a CreateAccountSubscriptionInput,
    ) -> ApiFuture<'a, CreateAccountSubscriptionOutput> {
        self.creates.lock().unwrap().push(input.clone());
        let reply = self.create.clone();
        Box::pin(async move {
            match reply {
                Reply::Ok => Ok(CreateAccountSubscriptionOutput {
                    request_id: Some("req-create".into()),
                    signup_response: Some(SignupResponse {
                        iam_user: true,
                        user_login_name: Some("admin".into()),
                        account_name: Some(input.account_name.clone()),
                        directory_type: None,
                    }),
                    status: Some(200),
                }),
                Reply::Empty => Ok(CreateAccountSubscriptionOutput {
                    status: Some(200),
                    ..Default::default()
                }),
                Reply::NotFound => Err(fault(RESOURCE_NOT_FOUND)),
                Reply::Fault(code) => Err(fault(code)),
            }
        })
    }

    fn describe_account_subscription<'a>(
        &'a self,
        input: &'a DescribeAccountSubscriptionInput,
    ) -> ApiFuture<'a, DescribeAccountSubscriptionOutput> {
        self.describes
            .lock()
            .unwrap()
            .push(input.aws_account_id.clone());
        let step = self.next_describe();
        Box::pin(async move {
            let info = match step {
                Describe::Status(status) => Some(account_info(status)),
                Describe::Info(info) => Some(info),
                Describe::Empty => None,
                Describe::NotFound => return Err(fault(RESOURCE_NOT_FOUND)),
                Describe::Fault(code) => return Err(fault(code)),
            };
            Ok(DescribeAccountSubscriptionOutput {
                account_info: info,
                request_id: Some("req-describe".into()),
                status: Some(200),
            })
        })
    }

    fn delete_account_subscription<'a>(
        &'a self,
        input: &'a DeleteAccountSubscriptionInput,
    ) -> ApiFuture<'a, DeleteAccountSubscriptionOutput> {
        self.deletes
            .lock()
            .unwrap()
            .push(input.aws_account_id.clone());
        let reply = self.delete.clone();
        Box::pin(async move {
            match reply {
                Reply::Ok | Reply::Empty => Ok(DeleteAccountSubscriptionOutput {
                    request_id: Some("req-delete".into()),
                    status: Some(200),
                }),
                Reply::NotFound => Err(fault(RESOURCE_NOT_FOUND)),
                Reply::Fault(code) => Err(fault(code)),
            }
        })
    }
}
