use std::{
    ops::ControlFlow,
    path::PathBuf,
    sync::mpsc::{self, Receiver},
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use smart_alarm::{
    communication::{Command, Snapshot, Update},
    ringtone::MemoryProvider,
    AlarmState, Alert, Service, ServiceHandle, Settings,
};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn service(settings: Settings) -> (Service<MemoryProvider>, Receiver<Update>) {
    let (tx, rx) = mpsc::channel();
    (Service::new(MemoryProvider::new(), settings, tx), rx)
}

fn set_alarm(h: u32, m: u32) -> Command {
    Command::SetAlarm {
        time: NaiveTime::from_hms_opt(h, m, 0),
        sound: Some(PathBuf::from("/sounds/rooster.ogg")),
        name: Some("work".to_string()),
    }
}

fn drain(updates: &Receiver<Update>) -> (Vec<Alert>, Vec<String>, Option<Snapshot>) {
    let mut alerts = vec![];
    let mut rejections = vec![];
    let mut snapshot = None;
    for update in updates.try_iter() {
        match update {
            Update::Alert(alert) => alerts.push(alert),
            Update::Rejected(reason) => rejections.push(reason),
            Update::Snapshot(latest) => snapshot = Some(latest),
        }
    }
    (alerts, rejections, snapshot)
}

#[test]
fn set_ring_and_stop() {
    let (mut service, updates) = service(Settings::default());
    service.handle(set_alarm(7, 0));
    let (alerts, _, snapshot) = drain(&updates);
    assert_eq!(alerts, vec![Alert::AlarmAdded(1)]);
    let snapshot = snapshot.unwrap();
    let alarm = snapshot.alarm(1).unwrap();
    assert_eq!(alarm.sound, "rooster");
    assert_eq!(alarm.name.as_deref(), Some("work"));

    service.handle(Command::Tick(at(7, 0, 0)));
    let (alerts, _, snapshot) = drain(&updates);
    assert!(matches!(alerts[..], [Alert::AlarmRinging { id: 1, .. }]));
    assert_eq!(snapshot.unwrap().ringing, Some(1));
    assert_eq!(service.provider().probes()[0].playing(), 1);

    service.handle(Command::RequestStop(1));
    let (alerts, _, snapshot) = drain(&updates);
    assert_eq!(alerts, vec![Alert::AlarmStopped(1)]);
    let snapshot = snapshot.unwrap();
    assert_eq!(snapshot.stats.wake_up_success(), 1);
    assert!(snapshot.alarms.is_empty());
    assert_eq!(service.provider().probes()[0].playing(), 0);
}

#[test]
fn snooze_uses_the_last_tick_as_now() {
    let (mut service, updates) = service(Settings::default());
    service.handle(set_alarm(7, 0));
    service.handle(Command::Tick(at(7, 0, 30)));
    service.handle(Command::RequestSnooze(1));
    let (alerts, _, snapshot) = drain(&updates);

    assert_eq!(
        alerts.last(),
        Some(&Alert::AlarmSnoozed {
            id: 1,
            until: at(7, 0, 35)
        })
    );
    let snapshot = snapshot.unwrap();
    assert_eq!(snapshot.alarms[0].state, AlarmState::Snoozed);
    assert_eq!(snapshot.stats.snooze_count(), 1);
}

#[test]
fn bad_commands_are_rejected_not_fatal() {
    let (mut service, updates) = service(Settings::default());
    assert_eq!(
        service.handle(Command::SetAlarm {
            time: None,
            sound: Some(PathBuf::from("a.mp3")),
            name: None,
        }),
        ControlFlow::Continue(())
    );
    service.handle(Command::SetAlarm {
        time: NaiveTime::from_hms_opt(7, 0, 0),
        sound: None,
        name: None,
    });
    service.handle(set_alarm(7, 0));
    service.handle(set_alarm(7, 0));
    service.handle(Command::RequestStop(1));
    service.handle(Command::RemoveAlarm(9));
    service.handle(Command::ChallengeWon(3));

    let (alerts, rejections, snapshot) = drain(&updates);
    assert_eq!(alerts, vec![Alert::AlarmAdded(1)]);
    assert_eq!(
        rejections,
        vec![
            "an alarm needs a time".to_string(),
            "an alarm needs a ringtone".to_string(),
            "an alarm is already set for 07:00".to_string(),
            "alarm 1 is not ringing".to_string(),
            "no alarm with id 9".to_string(),
            "no challenge is pending under ticket 3".to_string(),
        ]
    );
    assert_eq!(snapshot.unwrap().alarms.len(), 1);
}

#[test]
fn challenges_go_out_and_come_back() {
    let (mut service, updates) = service(Settings {
        challenge: true,
        ..Settings::default()
    });
    service.handle(set_alarm(7, 0));
    service.handle(Command::Tick(at(7, 0, 0)));
    service.handle(Command::RequestStop(1));
    let (alerts, _, snapshot) = drain(&updates);
    let Some(Alert::ChallengeIssued(request)) = alerts.last().cloned() else {
        panic!("expected a challenge, got {alerts:?}");
    };
    assert_eq!(snapshot.unwrap().challenges, vec![request.clone()]);

    service.handle(Command::CancelChallenge(request.ticket));
    let (alerts, _, snapshot) = drain(&updates);
    assert_eq!(alerts, vec![Alert::ChallengeCancelled(request.ticket)]);
    let snapshot = snapshot.unwrap();
    assert!(snapshot.challenges.is_empty());
    assert_eq!(snapshot.ringing, Some(1));

    service.handle(Command::RequestStop(1));
    let (alerts, _, _) = drain(&updates);
    let Some(Alert::ChallengeIssued(request)) = alerts.last().cloned() else {
        panic!("expected a challenge, got {alerts:?}");
    };
    service.handle(Command::ChallengeWon(request.ticket));
    let (alerts, _, snapshot) = drain(&updates);
    assert_eq!(alerts, vec![Alert::AlarmStopped(1)]);
    assert_eq!(snapshot.unwrap().stats.wake_up_success(), 1);
}

#[test]
fn configure_applies_to_the_next_ring() {
    let (mut service, updates) = service(Settings::default());
    let mut settings = Settings::default();
    settings.volume.base = 0.8;
    service.handle(Command::Configure(settings.clone()));
    service.handle(set_alarm(7, 0));
    service.handle(Command::Tick(at(7, 0, 0)));

    let (alerts, _, _) = drain(&updates);
    assert!(alerts
        .iter()
        .any(|alert| matches!(alert, Alert::AlarmRinging { volume, .. } if (volume - 0.8).abs() < 1e-6)));
    assert_eq!(service.clock().settings(), &settings);
}

#[test]
fn shutdown_silences_everything() {
    let (mut service, updates) = service(Settings::default());
    service.handle(set_alarm(7, 0));
    service.handle(Command::Tick(at(7, 0, 0)));
    assert_eq!(service.handle(Command::Shutdown), ControlFlow::Break(()));

    let (_, _, snapshot) = drain(&updates);
    assert_eq!(snapshot.unwrap(), Snapshot::default());
    assert_eq!(service.provider().probes()[0].playing(), 0);
}

#[test]
fn run_stops_when_the_senders_are_gone() {
    let (service, updates) = service(Settings::default());
    let provider = service.provider().clone();
    let (commands, inbox) = mpsc::channel();
    commands.send(set_alarm(7, 0)).unwrap();
    commands.send(Command::Tick(at(7, 0, 0))).unwrap();
    drop(commands);

    service.run(inbox);
    assert!(updates
        .try_iter()
        .any(|update| matches!(update, Update::Alert(Alert::AlarmRinging { .. }))));
    assert_eq!(provider.probes()[0].playing(), 0);
}

#[test]
fn handle_ticks_from_its_own_poller() {
    let provider = MemoryProvider::new();
    let probes = provider.clone();
    let mut handle = ServiceHandle::spawn_with(
        Settings::default(),
        Duration::from_millis(10),
        || at(7, 0, 0),
        move || provider,
    )
    .unwrap();
    handle.send(set_alarm(7, 0));

    let mut rang = false;
    while let Some(update) = handle.next_update(Duration::from_secs(5)) {
        if matches!(update, Update::Alert(Alert::AlarmRinging { id: 1, .. })) {
            rang = true;
            break;
        }
    }
    assert!(rang);
    assert_eq!(probes.probes()[0].playing(), 1);

    handle.shutdown();
    assert_eq!(probes.probes()[0].playing(), 0);
}
