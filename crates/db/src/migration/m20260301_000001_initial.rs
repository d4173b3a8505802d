//! Initial database migration.
//!
//! Creates the enums, `profiles`, `branches` and `invoices`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(PROFILES_SQL).await?;
        db.execute_unprepared(BRANCHES_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
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
CREATE TYPE user_role AS ENUM ('user', 'branch_manager', 'admin');

CREATE TYPE invoice_status AS ENUM (
    'draft',
    'pending_approval',
    'approved',
    'rejected',
    'submitted_to_bc'
);

CREATE TYPE payment_method AS ENUM (
    'cash',
    'transfer',
    'credit_card',
    'debit_card'
);
";

// id is the identity-provider user id; no default.
const PROFILES_SQL: &str = r"
CREATE TABLE profiles (
    id UUID PRIMARY KEY,
    email VARCHAR(255),
    full_name VARCHAR(255),
    role user_role NOT NULL DEFAULT 'user',
    branches TEXT[] NOT NULL DEFAULT '{}',
    area VARCHAR(100),
    monthly_limit NUMERIC(19, 4) CHECK (monthly_limit IS NULL OR monthly_limit >= 0),
    cash_limit NUMERIC(19, 4) CHECK (cash_limit IS NULL OR cash_limit >= 0),
    permissions TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_profiles_email ON profiles(lower(email)) WHERE email IS NOT NULL;
CREATE INDEX idx_profiles_role ON profiles(role);
CREATE INDEX idx_profiles_branches ON profiles USING GIN (branches);
";

const BRANCHES_SQL: &str = r"
CREATE TABLE branches (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_branches_name ON branches(lower(name));
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    branch VARCHAR(100),
    date DATE,
    currency CHAR(3) NOT NULL DEFAULT 'ARS',
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    payment_method payment_method,
    category VARCHAR(100),
    vendor VARCHAR(255),
    extracted_data JSONB NOT NULL DEFAULT '{}',
    ai_failed BOOLEAN NOT NULL DEFAULT false,
    receipt_key TEXT,
    status invoice_status NOT NULL DEFAULT 'draft',
    split_group_id UUID,
    is_parent BOOLEAN NOT NULL DEFAULT false,
    original_amount NUMERIC(19, 4),
    reviewed_by UUID REFERENCES profiles(id) ON DELETE SET NULL,
    reviewed_at TIMESTAMPTZ,
    rejection_reason TEXT,
    submitted_to_bc_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoices_amount CHECK (total_amount >= 0),
    CONSTRAINT chk_invoices_parent CHECK (NOT is_parent OR split_group_id IS NOT NULL),
    CONSTRAINT chk_invoices_rejection CHECK (status <> 'rejected' OR rejection_reason IS NOT NULL)
);

CREATE INDEX idx_invoices_user_date ON invoices(user_id, date);
CREATE INDEX idx_invoices_status ON invoices(status);
CREATE INDEX idx_invoices_branch ON invoices(lower(branch));
CREATE INDEX idx_invoices_split_group ON invoices(split_group_id) WHERE split_group_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_profiles_updated_at
    BEFORE UPDATE ON profiles
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_invoices_updated_at
    BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS invoices;
DROP TABLE IF EXISTS branches;
DROP TABLE IF EXISTS profiles;
DROP FUNCTION IF EXISTS set_updated_at();
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS user_role;
";
