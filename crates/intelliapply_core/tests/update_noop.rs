use std::sync::Once;

use intelliapply_core::{
    update, DashboardState, Effect, JobCounts, Msg, Phase, TaskReport, TaskStatus,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(intelliapply_logging::initialize_for_tests);
}

#[test]
fn tick_and_noop_do_not_change_state() {
    init_logging();
    let (mut state, _) = update(DashboardState::new(), Msg::Mounted { authenticated: true });
    state.consume_dirty();
    let before = state.view();

    let (state, effects) = update(state, Msg::Tick);
    assert!(effects.is_empty());
    let (mut state, effects) = update(state, Msg::NoOp);
    assert!(effects.is_empty());

    assert_eq!(state.view(), before);
    assert!(!state.consume_dirty());
}

#[test]
fn messages_before_mount_are_ignored() {
    init_logging();
    let (state, effects) = update(DashboardState::new(), Msg::RefreshClicked);
    assert!(effects.is_empty());
    assert_eq!(state, DashboardState::new());
}

#[test]
fn unmount_mid_poll_tears_down_and_ignores_late_results() {
    init_logging();
    let (state, _) = update(DashboardState::new(), Msg::Mounted { authenticated: true });
    let (state, _) = update(
        state,
        Msg::Reloaded {
            request_id: 1,
            jobs: Ok(Vec::new()),
            counts: Ok(JobCounts::default()),
        },
    );
    let (state, _) = update(state, Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::RefreshAccepted {
            task_id: "abc123".to_string(),
            message: "scheduled".to_string(),
        },
    );

    let (state, effects) = update(state, Msg::Unmounted);
    assert_eq!(effects, vec![Effect::Teardown]);
    assert_eq!(state.phase(), &Phase::Idle);
    assert!(!state.is_refresh_in_flight());

    let (state, effects) = update(
        state,
        Msg::PollResult {
            task_id: "abc123".to_string(),
            result: Ok(TaskReport {
                status: TaskStatus::Completed,
                message: "Done".to_string(),
            }),
        },
    );
    assert!(effects.is_empty());
    let (_, effects) = update(state, Msg::ProgressTick);
    assert!(effects.is_empty());
}

#[test]
fn remount_reloads_again() {
    init_logging();
    let (state, _) = update(DashboardState::new(), Msg::Mounted { authenticated: true });
    let (state, _) = update(state, Msg::Unmounted);
    let (state, effects) = update(state, Msg::Mounted { authenticated: true });
    assert!(matches!(effects.as_slice(), [Effect::ReloadAll { .. }]));
    assert!(matches!(state.phase(), Phase::Reloading { .. }));
}
