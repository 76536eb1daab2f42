// lib/src/prescription_service.rs

//! Access-controlled operations on prescriptions.
//!
//! Every operation receives the acting user explicitly. Reads that return a
//! prescription to a client (create, list, get) expand the patient and doctor
//! references; update and delete work on the raw record.

use std::sync::Arc;

use tracing::{debug, info};

use models::errors::RecordError;
use models::identifiers::parse_record_id;
use models::medical::{
    Actor, PopulatedPrescription, Population, Prescription, PrescriptionDraft,
    PrescriptionUpdate, Role, UserField,
};

use crate::errors::{AccessError, AccessResult};
use crate::payload::Payload;
use crate::storage_engine::{
    PrescriptionFilter, PrescriptionStore, SortDirection, Storage, UserDirectory,
};

/// Fields expanded on the record returned by `create`.
pub const CREATED_POPULATION: Population = Population {
    patient: &[UserField::Name, UserField::Email, UserField::Age, UserField::Gender],
    doctor: &[
        UserField::Name,
        UserField::Specialization,
        UserField::DoctorId,
        UserField::Email,
        UserField::Contact,
    ],
};

/// Fields expanded on records returned by `list` and `get_by_id`.
pub const LISTED_POPULATION: Population = Population {
    patient: &[
        UserField::Name,
        UserField::Email,
        UserField::PatientId,
        UserField::Age,
        UserField::Gender,
    ],
    doctor: &[
        UserField::Name,
        UserField::Specialization,
        UserField::DoctorId,
        UserField::Contact,
        UserField::Email,
    ],
};

const PRESCRIPTION_NOT_FOUND: &str = "Prescription not found";

#[derive(Clone)]
pub struct PrescriptionService {
    users: Arc<dyn UserDirectory>,
    prescriptions: Arc<dyn PrescriptionStore>,
}

impl PrescriptionService {
    pub fn new(users: Arc<dyn UserDirectory>, prescriptions: Arc<dyn PrescriptionStore>) -> Self {
        Self { users, prescriptions }
    }

    pub fn from_storage(storage: Storage) -> Self {
        Self::new(storage.users, storage.prescriptions)
    }

    /// Writes a new prescription authored by `actor` for the draft's patient.
    ///
    /// # Errors
    /// `Forbidden` unless the actor is a doctor, `NotFound` when the patient
    /// is missing or does not exist, `InvalidPayload` when the draft cannot
    /// be decoded.
    pub async fn create(
        &self,
        actor: &Actor,
        draft: impl Into<Payload<PrescriptionDraft>>,
    ) -> AccessResult<PopulatedPrescription> {
        if actor.role != Role::Doctor {
            return Err(AccessError::Forbidden("Only doctors can write prescriptions"));
        }

        let draft = draft.into().decode()?;
        let patient_id = draft
            .patient_id
            .as_deref()
            .and_then(parse_record_id)
            .ok_or(AccessError::NotFound("Patient not found"))?;
        if self.users.get_user_by_id(&patient_id).await?.is_none() {
            return Err(AccessError::NotFound("Patient not found"));
        }

        let created = self
            .prescriptions
            .create(draft.authored_by(patient_id, actor.id))
            .await?;
        info!("Doctor {} created prescription {} for patient {}", actor.id, created.id, patient_id);

        self.prescriptions
            .find_populated(&created.id, &CREATED_POPULATION)
            .await?
            .ok_or(AccessError::NotFound(PRESCRIPTION_NOT_FOUND))
    }

    /// Lists the prescriptions visible to `actor`, newest first.
    pub async fn list(&self, actor: &Actor) -> AccessResult<Vec<PopulatedPrescription>> {
        let filter = match actor.role {
            Role::Patient => PrescriptionFilter::Patient(actor.id),
            Role::Doctor => PrescriptionFilter::Doctor(actor.id),
            Role::Admin => PrescriptionFilter::All,
        };

        let prescriptions = self
            .prescriptions
            .find(filter, &LISTED_POPULATION, SortDirection::Descending)
            .await?;
        debug!("Listed {} prescriptions for {} {}", prescriptions.len(), actor.role, actor.id);
        Ok(prescriptions)
    }

    /// Fetches one prescription. Visible to its patient, its doctor and admins.
    pub async fn get_by_id(&self, actor: &Actor, id: &str) -> AccessResult<PopulatedPrescription> {
        let id = parse_record_id(id).ok_or(AccessError::NotFound(PRESCRIPTION_NOT_FOUND))?;
        let prescription = self
            .prescriptions
            .find_populated(&id, &LISTED_POPULATION)
            .await?
            .ok_or(AccessError::NotFound(PRESCRIPTION_NOT_FOUND))?;

        let allowed = match actor.role {
            Role::Patient => prescription.patient_ref == actor.id,
            Role::Doctor => prescription.doctor_ref == actor.id,
            Role::Admin => true,
        };
        if !allowed {
            return Err(AccessError::Forbidden("Not authorized to view this prescription"));
        }
        Ok(prescription)
    }

    /// Applies a partial update. Only the authoring doctor may edit.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        update: impl Into<Payload<PrescriptionUpdate>>,
    ) -> AccessResult<Prescription> {
        let mut prescription = self.owned_record(actor, id, "Not authorized to edit this prescription").await?;
        update.into().decode()?.apply_to(&mut prescription);

        let saved = self.prescriptions.save(&prescription).await?;
        info!("Doctor {} updated prescription {}", actor.id, saved.id);
        Ok(saved)
    }

    /// Removes a prescription. Only the authoring doctor may delete.
    pub async fn delete(&self, actor: &Actor, id: &str) -> AccessResult<()> {
        let prescription = self.owned_record(actor, id, "Not authorized to delete this prescription").await?;
        // A concurrent delete may have won since the ownership check.
        match self.prescriptions.delete(&prescription.id).await {
            Ok(()) => {}
            Err(RecordError::NotFound(_)) => return Err(AccessError::NotFound(PRESCRIPTION_NOT_FOUND)),
            Err(e) => return Err(e.into()),
        }
        info!("Doctor {} removed prescription {}", actor.id, prescription.id);
        Ok(())
    }

    async fn owned_record(
        &self,
        actor: &Actor,
        id: &str,
        denied: &'static str,
    ) -> AccessResult<Prescription> {
        let id = parse_record_id(id).ok_or(AccessError::NotFound(PRESCRIPTION_NOT_FOUND))?;
        let prescription = self
            .prescriptions
            .find_by_id(&id)
            .await?
            .ok_or(AccessError::NotFound(PRESCRIPTION_NOT_FOUND))?;

        if prescription.doctor_id != actor.id {
            return Err(AccessError::Unauthorized(denied));
        }
        Ok(prescription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_engine::{InMemoryStorage, SledPrescriptionStorage, SledUserStorage};
    use chrono::{Duration, Utc};
    use models::medical::{Medicine, NewUser, User};
    use uuid::Uuid;

    struct Fixture {
        storage: InMemoryStorage,
        service: PrescriptionService,
        doctor: User,
        other_doctor: User,
        patient: User,
        other_patient: User,
        admin: User,
    }

    fn new_user(name: &str, role: Role) -> User {
        User::from_new_user(NewUser {
            id: None,
            name: name.into(),
            email: format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
            role,
            age: Some(45),
            gender: Some("female".into()),
            specialization: (role == Role::Doctor).then(|| "General Practice".into()),
            contact: Some("555-0100".into()),
            doctor_id: (role == Role::Doctor).then(|| format!("DOC-{}", &name[..1])),
            patient_id: (role == Role::Patient).then(|| format!("PAT-{}", &name[..1])),
        })
    }

    async fn fixture() -> Fixture {
        let storage = InMemoryStorage::new();
        let service = PrescriptionService::new(Arc::new(storage.clone()), Arc::new(storage.clone()));
        let doctor = new_user("Dana Doctor", Role::Doctor);
        let other_doctor = new_user("Omar Doctor", Role::Doctor);
        let patient = new_user("Paula Patient", Role::Patient);
        let other_patient = new_user("Quinn Patient", Role::Patient);
        let admin = new_user("Ada Admin", Role::Admin);
        for user in [&doctor, &other_doctor, &patient, &other_patient, &admin] {
            storage.add_user(user).await.unwrap();
        }
        Fixture { storage, service, doctor, other_doctor, patient, other_patient, admin }
    }

    fn actor(user: &User) -> Actor {
        Actor::new(user.id, user.role)
    }

    fn draft(patient: &User, diagnosis: &str) -> PrescriptionDraft {
        PrescriptionDraft {
            patient_id: Some(patient.id.to_string()),
            diagnosis: diagnosis.into(),
            medicines: vec![Medicine {
                name: "Paracetamol".into(),
                dosage: Some("500mg".into()),
                frequency: Some("every 6 hours".into()),
                duration: Some("3 days".into()),
            }],
            instructions: "Drink plenty of water".into(),
        }
    }

    #[tokio::test]
    async fn only_doctors_can_create() {
        let f = fixture().await;
        for user in [&f.patient, &f.admin] {
            let err = f.service.create(&actor(user), draft(&f.patient, "flu")).await.unwrap_err();
            assert!(matches!(err, AccessError::Forbidden("Only doctors can write prescriptions")));
        }
        assert_eq!(f.storage.prescription_count().await, 0);
    }

    #[tokio::test]
    async fn create_requires_an_existing_patient() {
        let f = fixture().await;
        let mut unknown = draft(&f.patient, "flu");
        unknown.patient_id = Some(Uuid::new_v4().to_string());
        let err = f.service.create(&actor(&f.doctor), unknown).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Patient not found")));

        let mut malformed = draft(&f.patient, "flu");
        malformed.patient_id = Some("64f1c0ffee".into());
        let err = f.service.create(&actor(&f.doctor), malformed).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Patient not found")));

        let mut missing = draft(&f.patient, "flu");
        missing.patient_id = None;
        let err = f.service.create(&actor(&f.doctor), missing).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Patient not found")));

        assert_eq!(f.storage.prescription_count().await, 0);
    }

    #[tokio::test]
    async fn create_records_the_author_and_populates_both_references() {
        let f = fixture().await;
        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();

        assert_eq!(created.doctor_ref, f.doctor.id);
        assert_eq!(created.patient_ref, f.patient.id);

        let patient = created.patient.expect("patient populated");
        assert_eq!(patient.name.as_deref(), Some("Paula Patient"));
        assert_eq!(patient.email.as_deref(), Some("paula.patient@clinic.test"));
        assert_eq!(patient.age, Some(45));
        assert_eq!(patient.gender.as_deref(), Some("female"));
        assert_eq!(patient.patient_id, None);

        let doctor = created.doctor.expect("doctor populated");
        assert_eq!(doctor.name.as_deref(), Some("Dana Doctor"));
        assert_eq!(doctor.specialization.as_deref(), Some("General Practice"));
        assert_eq!(doctor.doctor_id.as_deref(), Some("DOC-D"));
        assert_eq!(doctor.contact.as_deref(), Some("555-0100"));
        assert_eq!(doctor.age, None);

        let stored = f.storage.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.doctor_id, f.doctor.id);
    }

    #[tokio::test]
    async fn list_is_scoped_by_role_and_sorted_newest_first() {
        let f = fixture().await;
        let doctor = actor(&f.doctor);
        let other_doctor = actor(&f.other_doctor);

        let first = f.service.create(&doctor, draft(&f.patient, "first")).await.unwrap();
        let second = f.service.create(&other_doctor, draft(&f.patient, "second")).await.unwrap();
        let third = f.service.create(&doctor, draft(&f.other_patient, "third")).await.unwrap();

        // Spread creation times so ordering does not depend on clock resolution.
        for (offset, id) in [(3, first.id), (2, second.id), (1, third.id)] {
            let mut record = f.storage.find_by_id(&id).await.unwrap().unwrap();
            record.created_at = Utc::now() - Duration::minutes(offset);
            f.storage.save(&record).await.unwrap();
        }

        let ids = |list: Vec<PopulatedPrescription>| list.into_iter().map(|p| p.id).collect::<Vec<_>>();

        let for_patient = f.service.list(&actor(&f.patient)).await.unwrap();
        assert_eq!(ids(for_patient), vec![second.id, first.id]);

        let for_doctor = f.service.list(&doctor).await.unwrap();
        assert_eq!(ids(for_doctor), vec![third.id, first.id]);

        let for_admin = f.service.list(&actor(&f.admin)).await.unwrap();
        assert_eq!(ids(for_admin), vec![third.id, second.id, first.id]);

        let listed = f.service.list(&actor(&f.other_patient)).await.unwrap();
        assert_eq!(listed.len(), 1);
        let patient = listed[0].patient.as_ref().unwrap();
        assert_eq!(patient.patient_id.as_deref(), Some("PAT-Q"));
    }

    #[tokio::test]
    async fn get_by_id_is_limited_to_patient_doctor_and_admin() {
        let f = fixture().await;
        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();
        let id = created.id.to_string();

        for user in [&f.patient, &f.doctor, &f.admin] {
            let found = f.service.get_by_id(&actor(user), &id).await.unwrap();
            assert_eq!(found.id, created.id);
            assert!(found.patient.is_some() && found.doctor.is_some());
        }

        for user in [&f.other_patient, &f.other_doctor] {
            let err = f.service.get_by_id(&actor(user), &id).await.unwrap_err();
            assert!(matches!(err, AccessError::Forbidden("Not authorized to view this prescription")));
        }

        // A doctor who happens to be listed as the patient still needs the patient role.
        let crossed = Actor::new(f.patient.id, Role::Doctor);
        assert!(matches!(
            f.service.get_by_id(&crossed, &id).await,
            Err(AccessError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_and_malformed_ids() {
        let f = fixture().await;
        let admin = actor(&f.admin);
        for id in [Uuid::new_v4().to_string(), "nope".to_string()] {
            let err = f.service.get_by_id(&admin, &id).await.unwrap_err();
            assert!(matches!(err, AccessError::NotFound("Prescription not found")));
        }
    }

    #[tokio::test]
    async fn update_is_owner_only_and_partial() {
        let f = fixture().await;
        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();
        let id = created.id.to_string();

        for user in [&f.other_doctor, &f.patient, &f.admin] {
            let err = f
                .service
                .update(&actor(user), &id, PrescriptionUpdate { diagnosis: Some("cold".into()), ..Default::default() })
                .await
                .unwrap_err();
            assert!(matches!(err, AccessError::Unauthorized("Not authorized to edit this prescription")));
        }

        let updated = f
            .service
            .update(
                &actor(&f.doctor),
                &id,
                PrescriptionUpdate { instructions: Some("Take after meals".into()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.diagnosis, "flu");
        assert_eq!(updated.instructions, "Take after meals");
        assert_eq!(updated.medicines.len(), 1);
        assert_eq!(updated.doctor_id, f.doctor.id);

        let replaced = f
            .service
            .update(
                &actor(&f.doctor),
                &id,
                PrescriptionUpdate { diagnosis: Some("influenza A".into()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(replaced.diagnosis, "influenza A");
    }

    #[tokio::test]
    async fn update_keeps_values_when_given_empty_strings() {
        let f = fixture().await;
        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();

        let updated = f
            .service
            .update(
                &actor(&f.doctor),
                &created.id.to_string(),
                PrescriptionUpdate {
                    diagnosis: Some(String::new()),
                    medicines: None,
                    instructions: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.diagnosis, "flu");
        assert_eq!(updated.instructions, "Drink plenty of water");
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .update(&actor(&f.doctor), &Uuid::new_v4().to_string(), PrescriptionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Prescription not found")));
    }

    #[tokio::test]
    async fn delete_is_owner_only() {
        let f = fixture().await;
        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();
        let id = created.id.to_string();

        for user in [&f.other_doctor, &f.patient, &f.admin] {
            let err = f.service.delete(&actor(user), &id).await.unwrap_err();
            assert!(matches!(err, AccessError::Unauthorized("Not authorized to delete this prescription")));
        }
        assert_eq!(f.storage.prescription_count().await, 1);

        f.service.delete(&actor(&f.doctor), &id).await.unwrap();
        let err = f.service.get_by_id(&actor(&f.doctor), &id).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound(_)));
    }

    #[tokio::test]
    async fn prescription_lifecycle() {
        let f = fixture().await;
        let doctor = actor(&f.doctor);

        let created = f.service.create(&doctor, draft(&f.patient, "flu")).await.unwrap();
        let id = created.id.to_string();

        let updated = f
            .service
            .update(&doctor, &id, PrescriptionUpdate { instructions: Some("Stay home".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.diagnosis, "flu");
        assert_eq!(updated.instructions, "Stay home");

        f.service.delete(&doctor, &id).await.unwrap();

        for user in [&f.doctor, &f.patient, &f.admin] {
            let err = f.service.get_by_id(&actor(user), &id).await.unwrap_err();
            assert!(matches!(err, AccessError::NotFound("Prescription not found")));
        }
    }

    #[tokio::test]
    async fn prescription_lifecycle_on_sled() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let users = SledUserStorage::new(&db).unwrap();
        let prescriptions = SledPrescriptionStorage::new(&db, users.clone()).unwrap();
        let doctor_user = new_user("Dana Doctor", Role::Doctor);
        let patient_user = new_user("Paula Patient", Role::Patient);
        users.add_user(&doctor_user).await.unwrap();
        users.add_user(&patient_user).await.unwrap();
        let service = PrescriptionService::new(Arc::new(users), Arc::new(prescriptions));
        let doctor = actor(&doctor_user);
        let patient = actor(&patient_user);

        let created = service.create(&doctor, draft(&patient_user, "flu")).await.unwrap();
        let patient_summary = created.patient.as_ref().unwrap();
        assert_eq!(patient_summary.name.as_deref(), Some("Paula Patient"));
        let id = created.id.to_string();

        let listed = service.list(&patient).await.unwrap();
        assert_eq!(listed.len(), 1);

        let updated = service
            .update(&doctor, &id, PrescriptionUpdate { instructions: Some("Stay home".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.diagnosis, "flu");

        service.delete(&doctor, &id).await.unwrap();
        let err = service.get_by_id(&patient, &id).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Prescription not found")));
    }

    #[tokio::test]
    async fn access_checks_run_before_the_body_is_decoded() {
        let f = fixture().await;
        let bodies: [&[u8]; 3] = [b"", b"{}", b"{not json"];
        for user in [&f.patient, &f.admin] {
            for body in bodies {
                let err = f
                    .service
                    .create(&actor(user), Payload::<PrescriptionDraft>::from_slice(body))
                    .await
                    .unwrap_err();
                assert!(matches!(err, AccessError::Forbidden("Only doctors can write prescriptions")));
            }
        }

        let err = f.service.create(&actor(&f.doctor), Payload::<PrescriptionDraft>::from_slice(b"")).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Patient not found")));

        let created = f.service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();
        let id = created.id.to_string();
        let err = f
            .service
            .update(&actor(&f.other_doctor), &id, Payload::<PrescriptionUpdate>::from_slice(b"{not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized(_)));

        let err = f
            .service
            .update(&actor(&f.doctor), &id, Payload::<PrescriptionUpdate>::from_slice(br#"{"medicines": "aspirin"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidPayload(_)));

        let unchanged = f
            .service
            .update(&actor(&f.doctor), &id, Payload::<PrescriptionUpdate>::from_slice(b""))
            .await
            .unwrap();
        assert_eq!(unchanged.diagnosis, "flu");
        assert_eq!(unchanged.medicines.len(), 1);
    }

    /// Finds records in `inner` but reports every delete as already gone.
    struct VanishingStore {
        inner: InMemoryStorage,
    }

    #[async_trait::async_trait]
    impl PrescriptionStore for VanishingStore {
        async fn create(&self, prescription: models::medical::NewPrescription) -> models::errors::RecordResult<Prescription> {
            self.inner.create(prescription).await
        }
        async fn find_by_id(&self, id: &Uuid) -> models::errors::RecordResult<Option<Prescription>> {
            self.inner.find_by_id(id).await
        }
        async fn find_populated(
            &self,
            id: &Uuid,
            population: &Population,
        ) -> models::errors::RecordResult<Option<PopulatedPrescription>> {
            self.inner.find_populated(id, population).await
        }
        async fn find(
            &self,
            filter: PrescriptionFilter,
            population: &Population,
            sort: SortDirection,
        ) -> models::errors::RecordResult<Vec<PopulatedPrescription>> {
            self.inner.find(filter, population, sort).await
        }
        async fn save(&self, prescription: &Prescription) -> models::errors::RecordResult<Prescription> {
            self.inner.save(prescription).await
        }
        async fn delete(&self, id: &Uuid) -> models::errors::RecordResult<()> {
            Err(RecordError::NotFound(*id))
        }
    }

    #[tokio::test]
    async fn delete_racing_another_delete_is_not_found() {
        let f = fixture().await;
        let service = PrescriptionService::new(
            Arc::new(f.storage.clone()),
            Arc::new(VanishingStore { inner: f.storage.clone() }),
        );
        let created = service.create(&actor(&f.doctor), draft(&f.patient, "flu")).await.unwrap();

        let err = service.delete(&actor(&f.doctor), &created.id.to_string()).await.unwrap_err();
        assert!(matches!(err, AccessError::NotFound("Prescription not found")));
    }
}
