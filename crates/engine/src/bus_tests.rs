// SPDX-License-Identifier: MIT

use super::*;
use el_core::ElementId;

#[test]
fn subscribers_receive_published_events() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();

    let id = ElementId::from_string("el-x");
    bus.publish(ChangeEvent::Element { id, action: crate::bus::ChangeAction::Created });

    assert_eq!(
        rx.try_recv().unwrap(),
        ChangeEvent::Element { id, action: crate::bus::ChangeAction::Created }
    );
}

#[test]
fn publish_without_subscribers_is_fine() {
    let bus = EventBus::new();
    bus.publish(ChangeEvent::Element {
        id: ElementId::from_string("el-x"),
        action: crate::bus::ChangeAction::Deleted,
    });
}

#[test]
fn late_subscriber_misses_earlier_events() {
    let bus = EventBus::new();
    let id = ElementId::from_string("el-x");
    bus.publish(ChangeEvent::Element { id, action: crate::bus::ChangeAction::Created });

    let mut rx = bus.subscribe();
    assert!(rx.try_recv().is_err());
}
