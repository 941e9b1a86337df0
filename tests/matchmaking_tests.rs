use broadside::MatchQueue;

#[test]
fn pairs_in_arrival_order() {
    let queue = MatchQueue::new();
    for user in [1, 2, 3, 4, 5] {
        assert!(queue.enqueue(user));
    }
    assert_eq!(queue.drain_pairs(), vec![(1, 2), (3, 4)]);
    assert_eq!(queue.len(), 1);
    assert!(queue.contains(5));
    assert!(queue.drain_pairs().is_empty());
}

#[test]
fn enqueue_is_idempotent() {
    let queue = MatchQueue::new();
    assert!(queue.enqueue(1));
    assert!(!queue.enqueue(1));
    assert_eq!(queue.len(), 1);
    assert!(queue.drain_pairs().is_empty());
}

#[test]
fn cancel_keeps_everybody_else_in_order() {
    let queue = MatchQueue::new();
    for user in [1, 2, 3] {
        queue.enqueue(user);
    }
    assert!(queue.cancel(2));
    assert!(!queue.cancel(2));
    assert_eq!(queue.position(3), Some(1));
    queue.enqueue(4);
    assert_eq!(queue.drain_pairs(), vec![(1, 3)]);
    assert_eq!(queue.position(4), Some(0));
}

#[test]
fn clones_share_the_queue() {
    let queue = MatchQueue::new();
    let other = queue.clone();
    queue.enqueue(1);
    other.enqueue(2);
    assert_eq!(queue.drain_pairs(), vec![(1, 2)]);
    assert!(other.is_empty());
}

#[test]
fn busy_users_are_dropped_instead_of_paired() {
    let queue = MatchQueue::new();
    for user in [1, 2, 3, 4, 5] {
        queue.enqueue(user);
    }
    assert_eq!(queue.drain_available_pairs(|u| u != 2), vec![(1, 3), (4, 5)]);
    assert!(queue.is_empty());

    for user in [6, 7, 8] {
        queue.enqueue(user);
    }
    assert!(queue.drain_available_pairs(|u| u != 7 && u != 8).is_empty());
    assert_eq!(queue.position(6), Some(0));
    assert_eq!(queue.len(), 1);
}
