//! End-to-end task lifecycles

#[path = "helpers.rs"]
mod helpers;

use helpers::{
    create_task, creator, creator_signature, hunter, milli_ether, other, setup_ledger, sign_claim,
    test_domain, ONE_DAY, STARTING_BALANCE, START_TIME, WORK_HASH,
};
use task_board_escrow::{EscrowError, TaskEvent, TaskStatus};

// ============================================================================
// SCENARIO TESTS
// ============================================================================

/// 1. Test: Happy Path
/// Creator posts 0.5 ETH for seven days, approves the hunter's work off-ledger, hunter claims.
/// Why: Exercises the full payout lifecycle including balances and the event trail.
#[test]
fn test_scenario_create_sign_claim() {
    let (mut ledger, _clock) = setup_ledger();
    let creator_address = creator().address();
    let hunter_address = hunter().address();
    let amount = milli_ether(500);

    let task_id = create_task(&mut ledger, amount, START_TIME + 7 * ONE_DAY);
    assert_eq!(task_id, 1);
    assert_eq!(ledger.get_task(task_id).status(ledger.now()), TaskStatus::Open);

    let signature = creator_signature(task_id, hunter_address);
    ledger
        .claim(task_id, hunter_address, WORK_HASH, signature.as_bytes())
        .unwrap();

    assert_eq!(ledger.balance_of(&creator_address), STARTING_BALANCE - amount);
    assert_eq!(ledger.balance_of(&hunter_address), STARTING_BALANCE + amount);
    assert_eq!(ledger.custody_balance(), 0);
    assert_eq!(ledger.get_task(task_id).status(ledger.now()), TaskStatus::Claimed);

    let names: Vec<&str> = ledger.events().iter().map(TaskEvent::name).collect();
    assert_eq!(names, vec!["TaskCreated", "TaskClaimed"]);
}

/// 2. Test: Expiry Path
/// Creator posts 0.75 ETH for three days, nobody claims, creator refunds after expiry.
/// Why: Exercises the deadline gate from both sides.
#[test]
fn test_scenario_create_expire_refund() {
    let (mut ledger, clock) = setup_ledger();
    let creator_address = creator().address();
    let amount = milli_ether(750);

    let task_id = create_task(&mut ledger, amount, START_TIME + 3 * ONE_DAY);

    clock.advance(ONE_DAY);
    assert_eq!(
        ledger.refund(creator_address, task_id),
        Err(EscrowError::DeadlineNotReached)
    );

    clock.advance(2 * ONE_DAY + 1);
    ledger.refund(creator_address, task_id).unwrap();

    assert_eq!(ledger.balance_of(&creator_address), STARTING_BALANCE);
    assert_eq!(ledger.custody_balance(), 0);

    let names: Vec<&str> = ledger.events().iter().map(TaskEvent::name).collect();
    assert_eq!(names, vec!["TaskCreated", "TaskRefunded"]);
}

/// 3. Test: Guard Rails
/// A 0.1 ETH task with a ten second window sees a forged claim, an early refund,
/// a stranger's refund, a valid claim, and a late refund, in that order.
/// Why: Only the valid claim may change state; custody stays consistent throughout.
#[test]
fn test_scenario_guard_rails() {
    let (mut ledger, clock) = setup_ledger();
    let creator_address = creator().address();
    let hunter_address = hunter().address();
    let amount = milli_ether(100);

    let task_id = create_task(&mut ledger, amount, START_TIME + 10);

    let forged = sign_claim(&hunter(), &test_domain(), task_id, hunter_address, WORK_HASH);
    assert_eq!(
        ledger.claim(task_id, hunter_address, WORK_HASH, forged.as_bytes()),
        Err(EscrowError::InvalidSignature)
    );
    assert_eq!(
        ledger.refund(creator_address, task_id),
        Err(EscrowError::DeadlineNotReached)
    );
    assert_eq!(
        ledger.refund(other().address(), task_id),
        Err(EscrowError::NotCreator)
    );
    assert!(ledger.custody_is_consistent());
    assert_eq!(ledger.custody_balance(), amount);

    let signature = creator_signature(task_id, hunter_address);
    ledger
        .claim(task_id, hunter_address, WORK_HASH, signature.as_bytes())
        .unwrap();

    clock.advance(11);
    assert_eq!(
        ledger.refund(creator_address, task_id),
        Err(EscrowError::AlreadyClaimed)
    );

    assert!(ledger.custody_is_consistent());
    assert_eq!(ledger.balance_of(&hunter_address), STARTING_BALANCE + amount);
    assert_eq!(ledger.events().len(), 2);
}

/// 4. Test: Independent Tasks
/// Several creators' tasks progress independently and custody tracks only open ones.
/// Why: One task's terminal transition must not touch another's funds.
#[test]
fn test_scenario_independent_tasks() {
    let (mut ledger, clock) = setup_ledger();
    let hunter_address = hunter().address();

    let claimed = create_task(&mut ledger, milli_ether(100), START_TIME + ONE_DAY);
    let refunded = create_task(&mut ledger, milli_ether(200), START_TIME + 10);
    let open = ledger
        .create_task(other().address(), START_TIME + 7 * ONE_DAY, milli_ether(300))
        .unwrap();

    let signature = creator_signature(claimed, hunter_address);
    ledger
        .claim(claimed, hunter_address, WORK_HASH, signature.as_bytes())
        .unwrap();
    clock.advance(11);
    ledger.refund(creator().address(), refunded).unwrap();

    assert_eq!(ledger.custody_balance(), milli_ether(300));
    assert!(ledger.custody_is_consistent());
    assert_eq!(ledger.get_task(open).status(ledger.now()), TaskStatus::Open);
    assert_eq!(ledger.next_task_id(), 4);
}
