//! Initial database migration.
//!
//! Creates the enums, balance holders, classification accounts, templates,
//! instances, card invoices, transfers and the ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BALANCE HOLDERS
        // ============================================================
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(BOXES_SQL).await?;

        // ============================================================
        // PART 3: CLASSIFICATION & CARDS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CARDS_SQL).await?;

        // ============================================================
        // PART 4: TEMPLATES & INSTANCES
        // ============================================================
        db.execute_unprepared(PROVISIONED_TEMPLATES_SQL).await?;
        db.execute_unprepared(TEMPLATE_EXCLUSIONS_SQL).await?;
        db.execute_unprepared(CARD_INVOICES_SQL).await?;
        db.execute_unprepared(TRANSACTION_INSTANCES_SQL).await?;

        // ============================================================
        // PART 5: TRANSFERS & LEDGER
        // ============================================================
        db.execute_unprepared(TRANSFERS_SQL).await?;
        db.execute_unprepared(LEDGER_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Direction of a classification account
CREATE TYPE account_type AS ENUM ('expense', 'income');

-- Template recurrence
CREATE TYPE recurrence_kind AS ENUM ('unique', 'installment', 'monthly', 'yearly');

-- Instance lifecycle
CREATE TYPE instance_status AS ENUM ('pending', 'confirmed');

-- How an instance is paid
CREATE TYPE payment_method AS ENUM ('account', 'card', 'undefined');

-- Card invoice lifecycle
CREATE TYPE invoice_status AS ENUM ('open', 'paid');

-- Ledger movement kind
CREATE TYPE movement_kind AS ENUM (
    'income',
    'expense',
    'transfer_in',
    'transfer_out',
    'box_contribution',
    'box_withdrawal'
);

-- Transfer kind, derived from the holder types on each side
CREATE TYPE transfer_kind AS ENUM (
    'account_to_account',
    'box_contribution',
    'box_withdrawal',
    'box_to_box'
);
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    initial_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    cached_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_bank_accounts_active ON bank_accounts(is_active);
";

const BOXES_SQL: &str = r"
CREATE TABLE boxes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    initial_value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    cached_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_boxes_bank_account ON boxes(bank_account_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    group_name VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const CARDS_SQL: &str = r"
CREATE TABLE cards (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    closing_day INTEGER NOT NULL,
    due_day INTEGER NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_card_closing_day CHECK (closing_day BETWEEN 1 AND 31),
    CONSTRAINT chk_card_due_day CHECK (due_day BETWEEN 1 AND 31)
);
";

const PROVISIONED_TEMPLATES_SQL: &str = r"
CREATE TABLE provisioned_templates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
    description VARCHAR(500) NOT NULL,
    expected_amount NUMERIC(19, 4) NOT NULL,
    bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE SET NULL,
    card_id UUID REFERENCES cards(id) ON DELETE SET NULL,
    box_id UUID REFERENCES boxes(id) ON DELETE SET NULL,
    recurrence recurrence_kind NOT NULL,
    installment_count INTEGER,
    current_installment INTEGER NOT NULL DEFAULT 1,
    start_date DATE NOT NULL,
    end_date DATE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_template_amount_positive CHECK (expected_amount > 0),
    CONSTRAINT chk_template_single_source CHECK (bank_account_id IS NULL OR card_id IS NULL),
    CONSTRAINT chk_template_dates CHECK (end_date IS NULL OR end_date >= start_date),
    CONSTRAINT chk_template_installments CHECK (
        (recurrence = 'installment' AND installment_count >= 1
            AND current_installment BETWEEN 1 AND installment_count)
        OR (recurrence <> 'installment' AND installment_count IS NULL)
    )
);

CREATE INDEX idx_templates_bank_account ON provisioned_templates(bank_account_id);
CREATE INDEX idx_templates_box ON provisioned_templates(box_id);
CREATE INDEX idx_templates_active ON provisioned_templates(is_active);
";

const TEMPLATE_EXCLUSIONS_SQL: &str = r"
CREATE TABLE template_exclusions (
    template_id UUID NOT NULL REFERENCES provisioned_templates(id) ON DELETE CASCADE,
    month_year CHAR(7) NOT NULL,
    PRIMARY KEY (template_id, month_year),
    CONSTRAINT chk_exclusion_month CHECK (month_year ~ '^[0-9]{4}-(0[1-9]|1[0-2])$')
);
";

const CARD_INVOICES_SQL: &str = r"
CREATE TABLE card_invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    card_id UUID NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
    month_year CHAR(7) NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    status invoice_status NOT NULL DEFAULT 'open',
    closing_date DATE NOT NULL,
    due_date DATE NOT NULL,
    paid_date DATE,
    paying_account_id UUID REFERENCES bank_accounts(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (card_id, month_year),
    CONSTRAINT chk_invoice_month CHECK (month_year ~ '^[0-9]{4}-(0[1-9]|1[0-2])$'),
    CONSTRAINT chk_invoice_paid CHECK (
        (status = 'open' AND paid_date IS NULL)
        OR (status = 'paid' AND paid_date IS NOT NULL)
    )
);
";

const TRANSACTION_INSTANCES_SQL: &str = r"
CREATE TABLE transaction_instances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    template_id UUID REFERENCES provisioned_templates(id) ON DELETE SET NULL,
    invoice_id UUID REFERENCES card_invoices(id) ON DELETE SET NULL,
    paid_invoice_id UUID REFERENCES card_invoices(id) ON DELETE SET NULL,
    month_year CHAR(7) NOT NULL,
    due_date DATE NOT NULL,
    description VARCHAR(500) NOT NULL,
    account_id UUID REFERENCES accounts(id) ON DELETE SET NULL,
    account_type account_type NOT NULL,
    expected_amount NUMERIC(19, 4) NOT NULL,
    actual_amount NUMERIC(19, 4),
    status instance_status NOT NULL DEFAULT 'pending',
    payment_method payment_method NOT NULL,
    bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE SET NULL,
    card_id UUID REFERENCES cards(id) ON DELETE SET NULL,
    box_id UUID REFERENCES boxes(id) ON DELETE SET NULL,
    confirmed_on DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (template_id, month_year),
    CONSTRAINT chk_instance_month CHECK (month_year ~ '^[0-9]{4}-(0[1-9]|1[0-2])$'),
    CONSTRAINT chk_instance_actual CHECK (
        (status = 'pending' AND actual_amount IS NULL)
        OR (status = 'confirmed' AND actual_amount IS NOT NULL AND actual_amount >= 0)
    )
);

CREATE INDEX idx_instances_month ON transaction_instances(month_year);
CREATE INDEX idx_instances_invoice ON transaction_instances(invoice_id);
CREATE INDEX idx_instances_bank_account ON transaction_instances(bank_account_id, month_year);
CREATE INDEX idx_instances_box ON transaction_instances(box_id, month_year);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    source_bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE CASCADE,
    source_box_id UUID REFERENCES boxes(id) ON DELETE CASCADE,
    destination_bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE CASCADE,
    destination_box_id UUID REFERENCES boxes(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    kind transfer_kind NOT NULL,
    transfer_date DATE NOT NULL,
    description VARCHAR(500) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transfer_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transfer_one_source CHECK (
        (source_bank_account_id IS NULL) <> (source_box_id IS NULL)
    ),
    CONSTRAINT chk_transfer_one_destination CHECK (
        (destination_bank_account_id IS NULL) <> (destination_box_id IS NULL)
    ),
    CONSTRAINT chk_transfer_distinct CHECK (
        source_bank_account_id IS DISTINCT FROM destination_bank_account_id
        OR source_box_id IS DISTINCT FROM destination_box_id
    )
);

CREATE INDEX idx_transfers_date ON transfers(transfer_date);
";

const LEDGER_MOVEMENTS_SQL: &str = r"
CREATE TABLE ledger_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bank_account_id UUID REFERENCES bank_accounts(id) ON DELETE CASCADE,
    box_id UUID REFERENCES boxes(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    kind movement_kind NOT NULL,
    description VARCHAR(500) NOT NULL,
    effective_date DATE NOT NULL,
    instance_id UUID REFERENCES transaction_instances(id) ON DELETE CASCADE,
    transfer_id UUID REFERENCES transfers(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_movement_one_holder CHECK ((bank_account_id IS NULL) <> (box_id IS NULL)),
    CONSTRAINT chk_movement_nonzero CHECK (amount <> 0)
);

CREATE INDEX idx_movements_bank_account ON ledger_movements(bank_account_id, effective_date, created_at);
CREATE INDEX idx_movements_box ON ledger_movements(box_id, effective_date, created_at);
CREATE INDEX idx_movements_instance ON ledger_movements(instance_id);
CREATE INDEX idx_movements_transfer ON ledger_movements(transfer_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_transfer_legs
-- A transfer owns exactly two movements that net to zero.
-- ============================================================
CREATE OR REPLACE FUNCTION check_transfer_legs()
RETURNS TRIGGER AS $$
DECLARE
    leg_count INTEGER;
    leg_sum NUMERIC(19, 4);
BEGIN
    SELECT COUNT(*), COALESCE(SUM(amount), 0)
    INTO leg_count, leg_sum
    FROM ledger_movements
    WHERE transfer_id = NEW.id;

    IF leg_count <> 2 OR leg_sum <> 0 THEN
        RAISE EXCEPTION 'Transfer % must have two legs netting to zero. Legs: %, Sum: %',
            NEW.id, leg_count, leg_sum;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_transfer_legs
AFTER INSERT ON transfers
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_transfer_legs();

-- ============================================================
-- FUNCTION: prevent_movement_update
-- Movements are append-only.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_movement_update()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger movements are immutable. Append a compensating movement instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_movement_update
BEFORE UPDATE ON ledger_movements
FOR EACH ROW
EXECUTE FUNCTION prevent_movement_update();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_movement_update ON ledger_movements;
DROP TRIGGER IF EXISTS trg_check_transfer_legs ON transfers;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_movement_update();
DROP FUNCTION IF EXISTS check_transfer_legs();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS ledger_movements CASCADE;
DROP TABLE IF EXISTS transfers CASCADE;
DROP TABLE IF EXISTS transaction_instances CASCADE;
DROP TABLE IF EXISTS card_invoices CASCADE;
DROP TABLE IF EXISTS template_exclusions CASCADE;
DROP TABLE IF EXISTS provisioned_templates CASCADE;
DROP TABLE IF EXISTS cards CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS boxes CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;

-- Drop types
DROP TYPE IF EXISTS transfer_kind;
DROP TYPE IF EXISTS movement_kind;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS instance_status;
DROP TYPE IF EXISTS recurrence_kind;
DROP TYPE IF EXISTS account_type;
";
