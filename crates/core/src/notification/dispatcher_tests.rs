//! Dispatcher tests against in-memory fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;
use uuid::Uuid;

use super::*;
use crate::budget::BudgetVerdict;
use crate::expense::Expense;

#[derive(Default)]
struct FakeDirectory {
    admins: Vec<String>,
    managers: HashMap<String, Vec<String>>,
    owners: HashMap<Uuid, OwnerInfo>,
    broken: bool,
}

impl RecipientDirectory for FakeDirectory {
    async fn admin_emails(&self) -> Result<Vec<String>, NotificationError> {
        if self.broken {
            return Err(NotificationError::Directory("connection reset".into()));
        }
        Ok(self.admins.clone())
    }

    async fn manager_emails(&self, branch: &str) -> Result<Vec<String>, NotificationError> {
        if self.broken {
            return Err(NotificationError::Directory("connection reset".into()));
        }
        Ok(self.managers.get(branch).cloned().unwrap_or_default())
    }

    async fn owner(&self, user_id: Uuid) -> Result<Option<OwnerInfo>, NotificationError> {
        Ok(self.owners.get(&user_id).cloned())
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<(Vec<String>, String)>>,
    fail: bool,
}

impl Mailer for FakeMailer {
    async fn send_html(
        &self,
        recipients: &[String],
        subject: &str,
        _html: &str,
    ) -> Result<String, NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("relay refused".into()));
        }
        self.sent
            .lock()
            .expect("lock")
            .push((recipients.to_vec(), subject.to_string()));
        Ok("<id@test>".to_string())
    }
}

fn context(owner: Uuid, branch: Option<&str>) -> ExpenseContext {
    let mut expense = Expense::draft(owner);
    expense.total_amount = dec!(500);
    expense.branch = branch.map(str::to_string);
    ExpenseContext::from_expense(&expense, None)
}

fn dispatcher(
    directory: FakeDirectory,
    mailer: FakeMailer,
) -> (NotificationDispatcher<FakeDirectory, FakeMailer>, Arc<FakeMailer>) {
    let mailer = Arc::new(mailer);
    (
        NotificationDispatcher::new(Arc::new(directory), Arc::clone(&mailer), "http://app"),
        mailer,
    )
}

#[tokio::test]
async fn test_pending_alerts_all_admins_once() {
    let directory = FakeDirectory {
        admins: vec![
            "a@corp.com".into(),
            " A@corp.com ".into(),
            "b@corp.com".into(),
            String::new(),
        ],
        ..FakeDirectory::default()
    };
    let (dispatcher, mailer) = dispatcher(directory, FakeMailer::default());

    let report = dispatcher
        .notify(BudgetVerdict::PendingApproval, &context(Uuid::new_v4(), None))
        .await;

    assert_eq!(
        report,
        DeliveryReport::Sent {
            message_id: "<id@test>".into(),
            recipients: 2
        }
    );
    let sent = mailer.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, vec!["a@corp.com".to_string(), "b@corp.com".to_string()]);
}

#[tokio::test]
async fn test_no_admins_is_soft_warning() {
    let (dispatcher, mailer) = dispatcher(FakeDirectory::default(), FakeMailer::default());
    let report = dispatcher
        .notify(BudgetVerdict::PendingApproval, &context(Uuid::new_v4(), None))
        .await;
    assert!(matches!(report, DeliveryReport::NoRecipients { .. }));
    assert!(mailer.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn test_approved_goes_to_invoice_branch_managers() {
    let mut managers = HashMap::new();
    managers.insert("Rosario".to_string(), vec!["jefe.rosario@corp.com".to_string()]);
    managers.insert("Córdoba".to_string(), vec!["jefe.cba@corp.com".to_string()]);
    let directory = FakeDirectory {
        managers,
        ..FakeDirectory::default()
    };
    let (dispatcher, mailer) = dispatcher(directory, FakeMailer::default());

    let report = dispatcher
        .notify(BudgetVerdict::Approved, &context(Uuid::new_v4(), Some("Rosario")))
        .await;

    assert!(report.is_sent());
    let sent = mailer.sent.lock().expect("lock");
    assert_eq!(sent[0].0, vec!["jefe.rosario@corp.com".to_string()]);
    assert!(sent[0].1.starts_with("Gasto listo para contabilizar"));
}

#[tokio::test]
async fn test_approved_falls_back_to_owner_branch() {
    let owner = Uuid::new_v4();
    let mut managers = HashMap::new();
    managers.insert("Córdoba".to_string(), vec!["jefe.cba@corp.com".to_string()]);
    let mut owners = HashMap::new();
    owners.insert(
        owner,
        OwnerInfo {
            full_name: Some("Ana".into()),
            email: None,
            branches: vec!["Córdoba".into(), "Rosario".into()],
        },
    );
    let directory = FakeDirectory {
        managers,
        owners,
        ..FakeDirectory::default()
    };
    let (dispatcher, mailer) = dispatcher(directory, FakeMailer::default());

    let report = dispatcher
        .notify(BudgetVerdict::Approved, &context(owner, None))
        .await;

    assert!(report.is_sent());
    assert_eq!(
        mailer.sent.lock().expect("lock")[0].0,
        vec!["jefe.cba@corp.com".to_string()]
    );
}

#[tokio::test]
async fn test_approved_without_any_branch_is_soft_warning() {
    let (dispatcher, _) = dispatcher(FakeDirectory::default(), FakeMailer::default());
    let report = dispatcher
        .notify(BudgetVerdict::Approved, &context(Uuid::new_v4(), None))
        .await;
    assert!(matches!(report, DeliveryReport::NoRecipients { .. }));
}

#[tokio::test]
async fn test_directory_failure_is_reported() {
    let directory = FakeDirectory {
        broken: true,
        ..FakeDirectory::default()
    };
    let (dispatcher, _) = dispatcher(directory, FakeMailer::default());
    let report = dispatcher
        .notify(BudgetVerdict::PendingApproval, &context(Uuid::new_v4(), None))
        .await;
    assert!(matches!(
        report,
        DeliveryReport::Failed { error } if error.contains("connection reset")
    ));
}

#[tokio::test]
async fn test_provider_failure_is_reported() {
    let directory = FakeDirectory {
        admins: vec!["a@corp.com".into()],
        ..FakeDirectory::default()
    };
    let mailer = FakeMailer {
        fail: true,
        ..FakeMailer::default()
    };
    let (dispatcher, _) = dispatcher(directory, mailer);
    let report = dispatcher
        .notify(BudgetVerdict::PendingApproval, &context(Uuid::new_v4(), None))
        .await;
    assert!(matches!(report, DeliveryReport::Failed { error } if error.contains("relay refused")));
}

#[tokio::test]
async fn test_dispatch_all_spawns_one_task_per_request() {
    let directory = FakeDirectory {
        admins: vec!["a@corp.com".into()],
        ..FakeDirectory::default()
    };
    let (dispatcher, mailer) = dispatcher(directory, FakeMailer::default());
    let dispatcher = Arc::new(dispatcher);

    let requests = (0..3)
        .map(|_| NotificationRequest {
            verdict: BudgetVerdict::PendingApproval,
            context: context(Uuid::new_v4(), None),
        })
        .collect();

    for handle in dispatcher.dispatch_all(requests) {
        assert!(handle.await.expect("task completes").is_sent());
    }
    assert_eq!(mailer.sent.lock().expect("lock").len(), 3);
}
