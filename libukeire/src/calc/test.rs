use super::*;
use crate::hand::parse_tiles;
use crate::t;
use parking_lot::Mutex;

/// Holds jobs until the test decides to complete them, in any order.
#[derive(Clone, Default)]
struct ManualExecutor {
    jobs: Arc<Mutex<Vec<(Job, Sender<Completion>)>>>,
}

impl ManualExecutor {
    fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Run the `idx`-th queued job and report it, even if it went stale in
    /// the meantime, like a worker that had already started.
    fn complete(&self, idx: usize) {
        let (job, done) = self.jobs.lock().remove(idx);
        done.send(job.run()).unwrap();
    }

    fn complete_all_reversed(&self) {
        while self.pending() > 0 {
            self.complete(self.pending() - 1);
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job, done: Sender<Completion>) {
        self.jobs.lock().push((job, done));
    }
}

fn manual() -> (Orchestrator, ManualExecutor) {
    let exec = ManualExecutor::default();
    (Orchestrator::new(Box::new(exec.clone())), exec)
}

#[test]
fn stale_completions_dropped() {
    let (mut orch, exec) = manual();
    let first = parse_tiles("45m123456p789s11z").unwrap();
    let second = parse_tiles("46m123456p789s11z").unwrap();

    assert_eq!(orch.status(), Status::Idle);
    assert_eq!(orch.submit(&first, &Wall::from_hand(&first)).unwrap(), Status::Loading);
    assert_eq!(orch.submit(&second, &Wall::from_hand(&second)).unwrap(), Status::Loading);
    assert_eq!(orch.generation(), 2);
    assert_eq!(exec.pending(), 2);

    // the newer job finishes first
    exec.complete(1);
    assert_eq!(orch.pump().unwrap(), Status::Ready);
    let res = orch.result().unwrap();
    assert_eq!(res.hand, second);
    assert_eq!(res.ukeire.primary, [t!(5m)]);

    // the older one arrives late and must not overwrite anything
    exec.complete(0);
    assert_eq!(orch.pump().unwrap(), Status::Ready);
    let res = orch.result().unwrap();
    assert_eq!(res.hand, second);
    assert_eq!(res.ukeire.primary, [t!(5m)]);
}

#[test]
fn previous_result_kept_while_loading() {
    let (mut orch, exec) = manual();
    let first = parse_tiles("45m123456p789s11z").unwrap();
    orch.submit(&first, &Wall::from_hand(&first)).unwrap();
    exec.complete_all_reversed();
    assert_eq!(orch.pump().unwrap(), Status::Ready);

    let second = parse_tiles("46m123456p789s11z").unwrap();
    orch.submit(&second, &Wall::from_hand(&second)).unwrap();
    assert_eq!(orch.status(), Status::Loading);
    assert_eq!(orch.result().unwrap().hand, first);
    assert_eq!(orch.pump().unwrap(), Status::Loading);
}

#[test]
fn discards_deduplicated() {
    let (mut orch, exec) = manual();
    let hand = parse_tiles("445m123456p789s11z").unwrap();
    assert_eq!(orch.submit(&hand, &Wall::from_hand(&hand)).unwrap(), Status::Loading);
    // 14 tiles over 12 distinct types
    assert_eq!(exec.pending(), 12);

    exec.complete_all_reversed();
    assert_eq!(orch.pump().unwrap(), Status::Ready);

    let res = orch.result().unwrap();
    assert_eq!(res.hand, sorted(&hand));
    assert_eq!(res.shanten, 0);
    assert_eq!(res.discards.as_ref().unwrap().len(), 14);

    let first = orch.acceptance_for(0).unwrap();
    assert!(Arc::ptr_eq(&first, &orch.acceptance_for(1).unwrap()));
    assert!(Arc::ptr_eq(&orch.acceptance_for(12).unwrap(), &orch.acceptance_for(13).unwrap()));
    assert!(!Arc::ptr_eq(&first, &orch.acceptance_for(2).unwrap()));
    assert!(orch.acceptance_for(14).is_none());

    assert_eq!(first.shanten, 0);
    assert_eq!(first.primary, t![3m, 6m]);
    assert_eq!(first.primary_count, 8);

    let five = orch.acceptance_for(2).unwrap();
    assert_eq!(five.shanten, 0);
    assert_eq!(five.primary, t![4m, E]);
    assert_eq!(five.primary_count, 4);

    for idx in 3..14 {
        assert_eq!(orch.acceptance_for(idx).unwrap().shanten, 1, "{idx}");
    }

    assert_eq!(orch.best_discard(), Some(0));
    assert_eq!(*res.ukeire, *first);
}

#[test]
fn complete_hand_keeps_best_discard_acceptance() {
    let (mut orch, exec) = manual();
    let hand = parse_tiles("123m456p789s11122z").unwrap();
    orch.submit(&hand, &Wall::from_hand(&hand)).unwrap();
    exec.complete_all_reversed();
    assert_eq!(orch.pump().unwrap(), Status::Ready);

    let res = orch.result().unwrap();
    assert_eq!(res.shanten, -1);
    assert_eq!(orch.best_discard(), Some(0));
    assert_eq!(res.ukeire.shanten, 0);
    assert_eq!(res.ukeire.primary, t![1m, 4m]);
    assert_eq!(res.ukeire.primary_count, 7);
}

#[test]
fn short_hands_ready_at_once() {
    let (mut orch, exec) = manual();
    assert_eq!(orch.submit(&[], &Wall::full()).unwrap(), Status::Ready);
    assert_eq!(orch.result().unwrap().shanten, MAX_SHANTEN);
    assert_eq!(exec.pending(), 0);

    let hand = parse_tiles("123m55p").unwrap();
    assert_eq!(orch.submit(&hand, &Wall::full()).unwrap(), Status::Ready);
    let res = orch.result().unwrap();
    assert_eq!(res.shanten, calc_tiles(&hand));
    assert!(res.ukeire.primary.is_empty());
    assert!(res.discards.is_none());
    assert_eq!(orch.best_discard(), None);
    assert_eq!(orch.acceptance_for(0), None);
    assert_eq!(orch.generation(), 2);
}

#[test]
fn invalid_hands_rejected() {
    let (mut orch, exec) = manual();
    let too_long = parse_tiles("123456789m123456p").unwrap();
    orch.submit(&too_long, &Wall::full()).unwrap_err();
    let five_copies = parse_tiles("11111m").unwrap();
    orch.submit(&five_copies, &Wall::full()).unwrap_err();

    assert_eq!(orch.status(), Status::Idle);
    assert_eq!(orch.generation(), 0);
    assert!(orch.result().is_none());
    assert_eq!(exec.pending(), 0);
}

#[test]
fn sequential_runs_one_per_pump() {
    let mut orch = Orchestrator::from_config(&CalcConfig {
        sequential: true,
        ..Default::default()
    })
    .unwrap();
    let hand = parse_tiles("445m123456p789s11z").unwrap();
    let wall = Wall::from_hand(&hand);
    orch.submit(&hand, &wall).unwrap();
    assert_eq!(orch.pump().unwrap(), Status::Loading);
    assert_eq!(orch.wait().unwrap(), Status::Ready);

    let res = orch.result().unwrap();
    for idx in 0..res.hand.len() {
        let mut after = res.hand.clone();
        after.remove(idx);
        assert_eq!(*orch.acceptance_for(idx).unwrap(), calc_ukeire(&after, &wall), "{idx}");
    }
}

#[test]
fn rayon_matches_direct() {
    let mut orch = Orchestrator::from_config(&CalcConfig {
        threads: 2,
        ..Default::default()
    })
    .unwrap();
    let superseded = parse_tiles("123456789p1234s").unwrap();
    let hand = parse_tiles("13579m2468p1357s").unwrap();
    let wall = Wall::from_hand(&hand);

    orch.submit(&superseded, &Wall::from_hand(&superseded)).unwrap();
    orch.submit(&hand, &wall).unwrap();
    assert_eq!(orch.wait().unwrap(), Status::Ready);

    let res = orch.result().unwrap();
    assert_eq!(res.hand, sorted(&hand));
    assert_eq!(*res.ukeire, calc_ukeire(&hand, &wall));
    assert_eq!(orch.generation(), 2);
}
